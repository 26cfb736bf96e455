//! # plaza-audit
//!
//! Content moderation client for the Plaza community marketplace.
//!
//! User-submitted text and image URLs are screened through a cloud content
//! classifier before publication. This crate wraps that HTTP API:
//!
//! - **Token management**: client-credentials access tokens with automatic
//!   refresh on expiry
//! - **Text censoring**: free-form text checked against the provider's
//!   user-defined policy
//! - **Image censoring**: publicly reachable image URLs, single or batched
//!
//! ## Quick Start
//!
//! ```ignore
//! use plaza_audit::{AuditClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AuditClient::new("api_key", "secret_key", Provider::default());
//!
//!     let verdict = client.censor_text("selling a barely used bicycle").await?;
//!     if verdict.passed {
//!         println!("ok to publish");
//!     } else {
//!         println!("rejected: {}", verdict.reasons.join(", "));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! There is deliberately no retry or circuit-breaker layer here: a transport
//! failure surfaces as an error and the caller decides what to do with the
//! unscreened content.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod provider;
pub mod token;

pub use client::{AuditClient, Verdict};
pub use error::{Error, Result};
pub use provider::Provider;
pub use token::AccessToken;
