//! Adapters Layer

pub mod hmac_token;

pub use hmac_token::{issue_token, HmacTokenAuthorizer, TOKEN_VERSION};
