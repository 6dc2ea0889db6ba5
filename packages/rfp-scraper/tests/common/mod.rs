#![allow(dead_code)]

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rfp_scraper::{BasicStrategy, EnhancedStrategy};

pub const NOTICE_ID: &str = "05255cc258ae40d2a5af9146663a89c5";

/// HTML response template.
pub fn html_response(html: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(html.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Serve `html` at `url_path` on a fresh server.
pub async fn mock_page(url_path: &str, html: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(html_response(html))
        .mount(&server)
        .await;

    server
}

/// Enhanced tier with no backoff so retry tests stay fast.
pub fn fast_enhanced(max_attempts: u32) -> EnhancedStrategy {
    EnhancedStrategy::new(Duration::from_secs(5))
        .unwrap()
        .with_max_attempts(max_attempts)
        .with_backoff(Duration::ZERO)
}

pub fn basic() -> BasicStrategy {
    BasicStrategy::new(Duration::from_secs(5)).unwrap()
}

/// A login wall: little text, one form.
pub const LOGIN_PAGE: &str = r#"<html><head><title>Portal</title></head><body>
<h2>Please sign in to continue</h2>
<form action="/session" method="post">
<input type="text" name="username" required>
<input type="password" name="password" required>
</form>
</body></html>"#;

/// One opportunity record in the `_embedded` envelope.
pub fn opportunity_json(notice_id: &str) -> serde_json::Value {
    serde_json::json!({
        "_embedded": {
            "opportunities": [{
                "noticeId": notice_id,
                "title": "Network Infrastructure Upgrade",
                "department": "DEPARTMENT OF VETERANS AFFAIRS",
                "subTier": "VETERANS AFFAIRS, DEPARTMENT OF",
                "office": "NETWORK CONTRACT OFFICE 8",
                "description": "The contractor shall upgrade network switching equipment at the medical center, including installation, configuration, testing and documentation of all new equipment.",
                "postedDate": "2024-03-01",
                "responseDeadLine": "2024-04-15T16:00:00-04:00",
                "naicsCode": "541512",
                "classificationCode": "D316",
                "active": "Yes",
                "pointOfContact": [{
                    "type": "primary",
                    "fullName": "Jordan Lee",
                    "title": "Contract Specialist",
                    "email": "jordan.lee@va.gov",
                    "phone": "555-0100"
                }],
                "links": [{"rel": "self", "href": "https://api.sam.gov/prod/opportunities/v2/search?noticeid=abc"}],
                "uiLink": format!("https://sam.gov/opp/{notice_id}/view")
            }]
        },
        "page": {"size": 1, "totalElements": 1, "totalPages": 1, "number": 0}
    })
}
