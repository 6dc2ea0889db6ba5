//! Credential handling for upstream services.

pub mod credentials;

pub use credentials::{SecretString, ServiceCredentials};
