use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, LocalizerError};
use crate::http::{build_client, error_detail};
use super::Translator;

/// Google Translate through the public `translate_a/single` web endpoint
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    source_language: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.google_endpoint.trim_end_matches('/').to_string(),
            source_language: config.source_language.clone(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.endpoint);
        let target = google_language_code(target_language);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_language.as_str()),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| LocalizerError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LocalizerError::Translation(format!(
                "Google API error {}",
                error_detail(response).await
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LocalizerError::Translation(format!("Failed to parse response: {}", e)))?;

        parse_response(&body)
    }
}

/// Google expects region subtags upper-cased ("zh-CN")
fn google_language_code(code: &str) -> String {
    match code.split_once('-') {
        Some((lang, region)) => format!("{}-{}", lang.to_lowercase(), region.to_uppercase()),
        None => code.to_lowercase(),
    }
}

/// The first element of the response is a list of `[translated, source, ...]`
/// sentence pairs; the translation is their concatenation.
fn parse_response(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| LocalizerError::Translation("Unexpected Google response shape".to_string()))?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(LocalizerError::Translation("Empty translation received".to_string()));
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn translator(endpoint: &str) -> GoogleTranslator {
        let mut config = Config::default().translate;
        config.google_endpoint = endpoint.to_string();
        GoogleTranslator::new(&config).unwrap()
    }

    #[test]
    fn parses_multi_sentence_response() {
        let body = json!([
            [["Bonjour. ", "Hello. ", null, null, 10], ["Bienvenue !", "Welcome!", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(parse_response(&body).unwrap(), "Bonjour. Bienvenue !");
    }

    #[test]
    fn rejects_unexpected_shape() {
        assert!(parse_response(&json!({"error": "nope"})).is_err());
        assert!(parse_response(&json!([[]])).is_err());
    }

    #[test]
    fn region_codes_are_normalized() {
        assert_eq!(google_language_code("zh-cn"), "zh-CN");
        assert_eq!(google_language_code("FR"), "fr");
    }

    #[tokio::test]
    async fn translates_against_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .and(query_param("tl", "zh-CN"))
            .and(query_param("sl", "auto"))
            .and(query_param("q", "Next slide"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[["下一张幻灯片", "Next slide"]]])))
            .mount(&server)
            .await;

        let result = translator(&server.uri()).translate("Next slide", "zh-cn").await.unwrap();
        assert_eq!(result, "下一张幻灯片");
    }

    #[tokio::test]
    async fn http_errors_are_translation_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let err = translator(&server.uri()).translate("Hello", "fr").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
