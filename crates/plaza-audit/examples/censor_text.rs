#![allow(clippy::expect_used, clippy::uninlined_format_args)]
//! Example: screen a piece of text through the cloud classifier.
//!
//! ## Running
//!
//! ```bash
//! export AUDIT_API_KEY="your-api-key"
//! export AUDIT_SECRET_KEY="your-secret-key"
//! cargo run --package plaza-audit --example censor_text -- "text to screen"
//! ```

use plaza_audit::{AuditClient, Provider};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaza_audit=debug".into()),
        )
        .init();

    let api_key = env::var("AUDIT_API_KEY").expect("AUDIT_API_KEY environment variable not set");
    let secret_key =
        env::var("AUDIT_SECRET_KEY").expect("AUDIT_SECRET_KEY environment variable not set");

    let text = env::args()
        .nth(1)
        .unwrap_or_else(|| "selling a barely used mountain bike, pickup only".to_string());

    let client = AuditClient::new(api_key, secret_key, Provider::default());

    println!("Screening: {text:?}");
    let verdict = client.censor_text(&text).await?;

    if verdict.passed {
        println!("PASS - content is publishable");
    } else {
        println!("REJECTED:");
        for reason in &verdict.reasons {
            println!("  - {reason}");
        }
    }

    Ok(())
}
