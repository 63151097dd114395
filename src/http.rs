use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::Result;

pub const USER_AGENT: &str = concat!("scorm-localizer/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the external service adapters
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Turn a non-success response into `(status, body)` for error messages
pub async fn error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(200).collect();
    format!("{} {}", status, body.trim())
}
