//! HTML content extraction.
//!
//! Pure, regex-driven extraction of headings, paragraphs, lists, links,
//! images, forms and tables from raw markup. Malformed or nested markup
//! degrades to partial output; nothing here can fail.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use url::Url;

use crate::types::result::{
    ContentList, ExtractionContent, Form, FormInput, Heading, Image, Link, ListKind, Table,
    TextContent,
};

/// Paragraphs at or under this many characters are layout noise.
const MIN_PARAGRAPH_CHARS: usize = 20;

lazy_static! {
    static ref COMMENT_REGEX: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref SCRIPT_REGEX: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
    static ref STYLE_REGEX: Regex = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();
    static ref NOSCRIPT_REGEX: Regex =
        Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").unwrap();
    static ref NAV_REGEX: Regex = Regex::new(r"(?is)<nav\b[^>]*>.*?</nav\s*>").unwrap();
    static ref HEADER_REGEX: Regex = Regex::new(r"(?is)<header\b[^>]*>.*?</header\s*>").unwrap();
    static ref FOOTER_REGEX: Regex = Regex::new(r"(?is)<footer\b[^>]*>.*?</footer\s*>").unwrap();

    static ref TAG_REGEX: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref BREAK_REGEX: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    static ref ENTITY_REGEX: Regex = Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|([a-zA-Z]+));").unwrap();

    static ref TITLE_REGEX: Regex = Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap();
    static ref HEADING_REGEX: Regex =
        Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").unwrap();
    static ref PARAGRAPH_REGEX: Regex = Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap();
    static ref LIST_REGEX: Regex =
        Regex::new(r"(?is)<(ul|ol)\b[^>]*>(.*?)</(?:ul|ol)\s*>").unwrap();
    static ref LIST_ITEM_REGEX: Regex = Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").unwrap();
    static ref ANCHOR_REGEX: Regex = Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap();
    static ref IMAGE_REGEX: Regex = Regex::new(r"(?is)<img\b([^>]*)>").unwrap();
    static ref FORM_REGEX: Regex = Regex::new(r"(?is)<form\b([^>]*)>(.*?)</form\s*>").unwrap();
    static ref FORM_FIELD_REGEX: Regex =
        Regex::new(r"(?is)<(?:input|textarea|select)\b([^>]*)>").unwrap();
    static ref TABLE_REGEX: Regex = Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").unwrap();
    static ref TABLE_HEADER_REGEX: Regex = Regex::new(r"(?is)<th\b[^>]*>(.*?)</th\s*>").unwrap();
    static ref TABLE_ROW_REGEX: Regex = Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").unwrap();
    static ref TABLE_CELL_REGEX: Regex = Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").unwrap();

    // name, then one of: "double", 'single', bare
    static ref ATTRIBUTE_REGEX: Regex = Regex::new(
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
    ).unwrap();
}

/// Extract structured content from `html`, resolving URLs against `base_url`.
///
/// `base_url` should be the post-redirect URL of the page. If it does not
/// parse, links and images are dropped and forms keep their raw action.
pub fn extract(html: &str, base_url: &str) -> ExtractionContent {
    let base = Url::parse(base_url).ok();
    let cleaned = strip_non_content(html);

    ExtractionContent {
        text: TextContent {
            full_text: text_from_cleaned(&cleaned),
            headings: extract_headings(&cleaned),
            paragraphs: extract_paragraphs(&cleaned),
            lists: extract_lists(&cleaned),
        },
        links: base
            .as_ref()
            .map(|b| extract_links(&cleaned, b))
            .unwrap_or_default(),
        forms: extract_forms(&cleaned, base.as_ref(), base_url),
        images: base
            .as_ref()
            .map(|b| extract_images(&cleaned, b))
            .unwrap_or_default(),
        tables: extract_tables(&cleaned),
    }
}

/// Extract the document title, if it has a non-empty one.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_REGEX
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_fragment(m.as_str()))
        .filter(|t| !t.is_empty())
}

/// Visible text of a page: scripts, styles, comments and page chrome
/// (nav/header/footer) removed, whitespace collapsed.
pub fn extract_text(html: &str) -> String {
    text_from_cleaned(&strip_non_content(html))
}

/// Remove comments, scripts, styles and noscript blocks.
fn strip_non_content(html: &str) -> String {
    let text = COMMENT_REGEX.replace_all(html, "");
    let text = SCRIPT_REGEX.replace_all(&text, "");
    let text = STYLE_REGEX.replace_all(&text, "");
    NOSCRIPT_REGEX.replace_all(&text, "").into_owned()
}

fn text_from_cleaned(cleaned: &str) -> String {
    let text = NAV_REGEX.replace_all(cleaned, "");
    let text = HEADER_REGEX.replace_all(&text, "");
    let text = FOOTER_REGEX.replace_all(&text, "");
    let text = TAG_REGEX.replace_all(&text, " ");
    collapse_whitespace(&decode_entities(&text))
}

/// Text of an inline fragment: tags dropped, entities decoded, whitespace
/// collapsed.
fn clean_fragment(fragment: &str) -> String {
    let text = BREAK_REGEX.replace_all(fragment, " ");
    let text = TAG_REGEX.replace_all(&text, "");
    collapse_whitespace(&decode_entities(&text))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

/// Decode character references in one pass, so decoded text is never
/// decoded again. Unknown named references are left as written.
fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |cap: &regex::Captures| {
            let decoded = match (cap.get(1), cap.get(2), cap.get(3)) {
                (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from),
                (_, Some(dec), _) => dec
                    .as_str()
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from),
                (_, _, Some(name)) => named_entity(name.as_str()).map(str::to_string),
                _ => None,
            };
            match decoded {
                Some(text) => text,
                // Invalid code points vanish; unknown names stay literal.
                None if cap.get(3).is_some() => cap[0].to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => " ",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "ndash" => "–",
        "mdash" => "—",
        "amp" => "&",
        _ => return None,
    })
}

/// Parse a tag's attribute string into lowercase-name → decoded value.
/// Boolean attributes map to an empty string. First occurrence wins.
fn parse_attributes(attrs: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for cap in ATTRIBUTE_REGEX.captures_iter(attrs) {
        let name = cap[1].to_ascii_lowercase();
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| decode_entities(m.as_str()).trim().to_string())
            .unwrap_or_default();
        map.entry(name).or_insert(value);
    }
    map
}

fn extract_headings(html: &str) -> Vec<Heading> {
    HEADING_REGEX
        .captures_iter(html)
        .filter_map(|cap| {
            let level = cap[1].parse::<u8>().ok()?;
            let text = clean_fragment(&cap[2]);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn extract_paragraphs(html: &str) -> Vec<String> {
    PARAGRAPH_REGEX
        .captures_iter(html)
        .map(|cap| clean_fragment(&cap[1]))
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect()
}

fn extract_lists(html: &str) -> Vec<ContentList> {
    LIST_REGEX
        .captures_iter(html)
        .filter_map(|cap| {
            let kind = if cap[1].eq_ignore_ascii_case("ol") {
                ListKind::Ol
            } else {
                ListKind::Ul
            };
            let items: Vec<String> = LIST_ITEM_REGEX
                .captures_iter(&cap[2])
                .map(|item| clean_fragment(&item[1]))
                .filter(|item| !item.is_empty())
                .collect();
            (!items.is_empty()).then_some(ContentList { kind, items })
        })
        .collect()
}

/// Whether an href/src points nowhere useful.
fn is_skippable_reference(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    value.is_empty()
        || value.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
}

/// Resolve an href/src against the page URL.
///
/// Scheme-relative values (`//host/path`) are skipped. Path-absolute values
/// are appended to the page origin; everything else goes through standard
/// relative resolution.
pub fn resolve_url(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.starts_with("//") {
        return None;
    }
    if raw.starts_with('/') {
        let origin = base.origin();
        if !origin.is_tuple() {
            return None;
        }
        return Url::parse(&format!("{}{}", origin.ascii_serialization(), raw)).ok();
    }
    base.join(raw).ok()
}

fn extract_links(html: &str, base: &Url) -> Vec<Link> {
    ANCHOR_REGEX
        .captures_iter(html)
        .filter_map(|cap| {
            let attrs = parse_attributes(&cap[1]);
            let href = attrs.get("href")?;
            build_link(href, &clean_fragment(&cap[2]), base)
        })
        .collect()
}

fn extract_images(html: &str, base: &Url) -> Vec<Image> {
    IMAGE_REGEX
        .captures_iter(html)
        .filter_map(|cap| {
            let attrs = parse_attributes(&cap[1]);
            let src = attrs.get("src")?;
            build_image(src, attrs.get("alt").map(String::as_str).unwrap_or_default(), base)
        })
        .collect()
}

/// A link from a raw href, resolved against `base`. `None` for references
/// that are skipped or do not resolve.
pub(crate) fn build_link(href: &str, text: &str, base: &Url) -> Option<Link> {
    if is_skippable_reference(href) {
        return None;
    }
    let absolute = resolve_url(href, base)?;
    let text = text.trim();

    Some(Link {
        text: if text.is_empty() { href.to_string() } else { text.to_string() },
        is_external: absolute.host_str() != base.host_str(),
        absolute_url: absolute.to_string(),
        href: href.to_string(),
    })
}

/// An image from a raw src, resolved against `base`. Data URIs are skipped.
pub(crate) fn build_image(src: &str, alt: &str, base: &Url) -> Option<Image> {
    if src.is_empty() || src.to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    let absolute = resolve_url(src, base)?;

    Some(Image {
        absolute_url: absolute.to_string(),
        alt: alt.to_string(),
        src: src.to_string(),
    })
}

fn extract_forms(html: &str, base: Option<&Url>, page_url: &str) -> Vec<Form> {
    FORM_REGEX
        .captures_iter(html)
        .map(|cap| {
            let attrs = parse_attributes(&cap[1]);

            let action = match attrs.get("action").filter(|a| !a.is_empty()) {
                None => page_url.to_string(),
                Some(raw) => base
                    .and_then(|b| resolve_url(raw, b))
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| page_url.to_string()),
            };

            let method = attrs
                .get("method")
                .filter(|m| !m.is_empty())
                .map(|m| m.to_uppercase())
                .unwrap_or_else(|| "GET".to_string());

            let inputs = FORM_FIELD_REGEX
                .captures_iter(&cap[2])
                .map(|field| {
                    let field_attrs = parse_attributes(&field[1]);
                    FormInput {
                        input_type: field_attrs
                            .get("type")
                            .filter(|t| !t.is_empty())
                            .cloned()
                            .unwrap_or_else(|| "text".to_string()),
                        name: field_attrs.get("name").cloned().unwrap_or_default(),
                        placeholder: field_attrs.get("placeholder").cloned().unwrap_or_default(),
                        required: field_attrs.contains_key("required"),
                    }
                })
                .collect();

            Form {
                action,
                method,
                inputs,
            }
        })
        .collect()
}

fn extract_tables(html: &str) -> Vec<Table> {
    TABLE_REGEX
        .captures_iter(html)
        .map(|cap| {
            let table_html = &cap[1];

            let headers = TABLE_HEADER_REGEX
                .captures_iter(table_html)
                .map(|h| clean_fragment(&h[1]))
                .collect();

            // Header rows hold only <th> cells, so they drop out here.
            let rows: Vec<Vec<String>> = TABLE_ROW_REGEX
                .captures_iter(table_html)
                .map(|row| {
                    TABLE_CELL_REGEX
                        .captures_iter(&row[1])
                        .map(|cell| clean_fragment(&cell[1]))
                        .collect::<Vec<_>>()
                })
                .filter(|row| !row.is_empty())
                .collect();

            Table {
                headers,
                total_rows: rows.len(),
                rows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.gov/rfp/123";

    #[test]
    fn test_full_text_strips_chrome_and_scripts() {
        let html = r#"
            <html><head><style>.x { color: red; }</style></head>
            <body>
              <nav>Home | About</nav>
              <header>Agency Banner</header>
              <!-- hidden comment -->
              <script>var secret = "do not index";</script>
              <noscript>Enable JS</noscript>
              <main><p>Proposals   are due
                 on Friday.</p></main>
              <footer>Copyright</footer>
            </body></html>
        "#;

        let text = extract_text(html);
        assert_eq!(text, "Proposals are due on Friday.");
    }

    #[test]
    fn test_headings_case_insensitive_and_nested_tags() {
        let html = r#"
            <H1 class="title">Request for <em>Proposal</em></H1>
            <h2></h2>
            <h3><span>Scope</span> of Work</h3>
        "#;

        let headings = extract_headings(html);
        assert_eq!(
            headings,
            vec![
                Heading {
                    level: 1,
                    text: "Request for Proposal".to_string()
                },
                Heading {
                    level: 3,
                    text: "Scope of Work".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_short_paragraphs_are_dropped() {
        let html = "<p>Too short.</p><p>This paragraph is long enough to keep.</p><pre>not a p</pre>";
        let paragraphs = extract_paragraphs(html);
        assert_eq!(paragraphs, vec!["This paragraph is long enough to keep."]);
    }

    #[test]
    fn test_lists_keep_order_and_drop_empty() {
        let html = r#"
            <ul><li>Alpha</li><li> </li><li><b>Beta</b></li></ul>
            <ol></ol>
            <OL><li>First step</li></OL>
        "#;

        let lists = extract_lists(html);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].kind, ListKind::Ul);
        assert_eq!(lists[0].items, vec!["Alpha", "Beta"]);
        assert_eq!(lists[1].kind, ListKind::Ol);
        assert_eq!(lists[1].items, vec!["First step"]);
    }

    #[test]
    fn test_link_resolution_and_external_flag() {
        let base = Url::parse(BASE).unwrap();
        let html = r##"
            <a href="/about">About</a>
            <a href="docs/sow.pdf">Statement of Work</a>
            <a href="https://sam.gov/opp/abc/view">SAM</a>
            <a href="//cdn.example.gov/file.pdf">CDN</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">JS</a>
            <a href="">Empty</a>
            <a href="mailto:buyer@example.gov">Mail</a>
            <a name="anchor">No href</a>
            <a href='/contact'></a>
        "##;

        let links = extract_links(html, &base);
        let urls: Vec<&str> = links.iter().map(|l| l.absolute_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.gov/about",
                "https://example.gov/rfp/docs/sow.pdf",
                "https://sam.gov/opp/abc/view",
                "https://example.gov/contact",
            ]
        );

        assert!(!links[0].is_external);
        assert!(!links[1].is_external);
        assert!(links[2].is_external);
        assert_eq!(links[3].text, "/contact");
    }

    #[test]
    fn test_images_skip_data_uris() {
        let base = Url::parse(BASE).unwrap();
        let html = r#"
            <img src="/seal.png" alt="Agency seal">
            <img src="data:image/png;base64,AAAA">
            <img src="">
            <img alt="no src">
            <IMG SRC="banner.jpg">
        "#;

        let images = extract_images(html, &base);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].absolute_url, "https://example.gov/seal.png");
        assert_eq!(images[0].alt, "Agency seal");
        assert_eq!(images[1].absolute_url, "https://example.gov/rfp/banner.jpg");
        assert_eq!(images[1].alt, "");
    }

    #[test]
    fn test_forms_defaults() {
        let html = r#"
            <form>
              <input name="q" placeholder="Search">
              <textarea name="notes" required></textarea>
            </form>
            <form action="/login" method="post">
              <input type="password" name="pw" required="required">
              <select name="role"><option>A</option></select>
            </form>
        "#;

        let content = extract(html, BASE);
        let forms = content.forms;
        assert_eq!(forms.len(), 2);

        assert_eq!(forms[0].action, BASE);
        assert_eq!(forms[0].method, "GET");
        assert_eq!(forms[0].inputs.len(), 2);
        assert_eq!(forms[0].inputs[0].input_type, "text");
        assert_eq!(forms[0].inputs[0].placeholder, "Search");
        assert!(!forms[0].inputs[0].required);
        assert!(forms[0].inputs[1].required);

        assert_eq!(forms[1].action, "https://example.gov/login");
        assert_eq!(forms[1].method, "POST");
        assert_eq!(forms[1].inputs[0].input_type, "password");
        assert!(forms[1].inputs[0].required);
        assert_eq!(forms[1].inputs[1].name, "role");
    }

    #[test]
    fn test_tables_exclude_header_row() {
        let html = r#"
            <table>
              <thead><tr><th>Item</th><th>Due</th></tr></thead>
              <tbody>
                <tr><td>Proposal</td><td>2025-03-01</td></tr>
                <tr></tr>
                <tr><td>Questions</td><td>2025-02-01</td></tr>
              </tbody>
            </table>
        "#;

        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Item", "Due"]);
        assert_eq!(tables[0].total_rows, 2);
        assert_eq!(tables[0].rows[1], vec!["Questions", "2025-02-01"]);
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<h1>Parks &amp; Recreation &#8211; RFP&nbsp;#42 &amp;lt;</h1>";
        let headings = extract_headings(html);
        assert_eq!(headings[0].text, "Parks & Recreation – RFP #42 &lt;");
    }

    #[test]
    fn test_entities_decoded_once() {
        assert_eq!(decode_entities("&#38;lt;b&#x26;gt;"), "&lt;b&gt;");
        assert_eq!(decode_entities("&copy; &#xD800; &QUOT"), "&copy;  &QUOT");
    }

    #[test]
    fn test_title() {
        assert_eq!(
            extract_title("<html><head><TITLE> Bid Notice </TITLE></head></html>"),
            Some("Bid Notice".to_string())
        );
        assert_eq!(extract_title("<title>  </title>"), None);
        assert_eq!(extract_title("<body>No title</body>"), None);
    }

    #[test]
    fn test_malformed_html_degrades() {
        let html = "<div><h1>Open heading<p>Unclosed paragraph that runs on and on<ul><li>item";
        let content = extract(html, BASE);
        assert!(content.text.headings.is_empty());
        assert!(content.text.full_text.contains("Unclosed paragraph"));
    }

    #[test]
    fn test_invalid_base_url_keeps_text() {
        let html = r#"<h1>Title</h1><a href="/x">X</a><form action="/go"></form>"#;
        let content = extract(html, "not a url");
        assert_eq!(content.text.headings.len(), 1);
        assert!(content.links.is_empty());
        assert_eq!(content.forms[0].action, "not a url");
    }

    #[test]
    fn test_extract_is_idempotent() {
        let html = r#"<h1>Notice</h1><p>Some paragraph text that is long enough.</p>
            <a href="/a">A</a><img src="b.png"><table><tr><td>c</td></tr></table>"#;
        assert_eq!(extract(html, BASE), extract(html, BASE));
    }
}
