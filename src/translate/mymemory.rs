use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, LocalizerError};
use crate::http::{build_client, error_detail};
use super::Translator;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<MyMemoryData>,
    // Number on success, sometimes a string on quota errors
    response_status: Value,
    #[serde(default)]
    response_details: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: String,
}

/// MyMemory translation memory API, used as the fallback provider
pub struct MyMemoryTranslator {
    client: Client,
    endpoint: String,
    source_language: String,
}

impl MyMemoryTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.mymemory_endpoint.trim_end_matches('/').to_string(),
            source_language: config.source_language.clone(),
        })
    }

    fn language_pair(&self, target_language: &str) -> String {
        let source = if self.source_language.eq_ignore_ascii_case("auto") {
            "Autodetect"
        } else {
            self.source_language.as_str()
        };
        format!("{}|{}", source, target_language)
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let url = format!("{}/get", self.endpoint);
        let langpair = self.language_pair(target_language);
        debug!("Sending MyMemory request for {}", langpair);

        let response = self
            .client
            .get(&url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(|e| LocalizerError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LocalizerError::Translation(format!(
                "MyMemory API error {}",
                error_detail(response).await
            )));
        }

        let body: MyMemoryResponse = response
            .json()
            .await
            .map_err(|e| LocalizerError::Translation(format!("Failed to parse response: {}", e)))?;

        extract_translation(body)
    }
}

fn extract_translation(body: MyMemoryResponse) -> Result<String> {
    let status = match &body.response_status {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    if status != Some(200) {
        return Err(LocalizerError::Translation(format!(
            "MyMemory status {}: {}",
            body.response_status, body.response_details
        )));
    }

    let text = body
        .response_data
        .map(|d| d.translated_text)
        .unwrap_or_default();

    // Quota exhaustion is reported inside the translation text
    if text.trim().is_empty() || text.starts_with("MYMEMORY WARNING") {
        return Err(LocalizerError::Translation(format!("MyMemory refused: {}", text)));
    }
    Ok(text)
}
