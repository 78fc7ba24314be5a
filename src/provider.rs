use crate::describe::DescribeError;
use anyhow::Context;
use base64::Engine as _;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Default bound on how long a single description attempt may wait.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DESCRIPTION_PROMPT: &str =
    "Describe this image concisely for a person who cannot see it. \
     Mention any text that appears in the image.";

/// The remote service that turns image bytes plus a credential into
/// descriptive text. Behind a trait so tests and alternative backends can
/// stand in for the HTTP client.
pub trait DescriptionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Blocking call, bounded by the provider's timeout. Runs on a worker
    /// thread, never on the engine's own thread.
    fn describe(&self, image: &[u8], credential: &str) -> Result<String, DescribeError>;
}

/// OpenAI-style vision chat endpoint: the image travels as a base64 data
/// URL inside a chat message.
pub struct HttpVisionProvider {
    name: String,
    endpoint: Url,
    model: String,
    client: reqwest::blocking::Client,
}

impl HttpVisionProvider {
    pub fn new(name: &str, endpoint: &str, model: &str) -> anyhow::Result<Self> {
        Self::with_timeout(name, endpoint, model, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        name: &str,
        endpoint: &str,
        model: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint).with_context(|| format!("invalid endpoint {endpoint}"))?;
        let client = reqwest::blocking::Client::builder()
            .user_agent("page-narrator describe")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            name: name.to_string(),
            endpoint,
            model: model.to_string(),
            client,
        })
    }

    fn data_url(image: &[u8]) -> String {
        let mime = match image::guess_format(image) {
            Ok(image::ImageFormat::Png) => "image/png",
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(image::ImageFormat::Gif) => "image/gif",
            Ok(image::ImageFormat::WebP) => "image/webp",
            _ => "image/png",
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        format!("data:{mime};base64,{encoded}")
    }
}

impl DescriptionProvider for HttpVisionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, image: &[u8], credential: &str) -> Result<String, DescribeError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 300,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": DESCRIPTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": Self::data_url(image) } }
                ]
            }]
        });

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(credential)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DescribeError::Timeout
                } else {
                    DescribeError::NetworkError(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DescribeError::ProviderError(format!(
                "unexpected status {status}"
            )));
        }

        let json: Value = resp
            .json()
            .map_err(|e| DescribeError::ProviderError(format!("unreadable response: {e}")))?;
        json["choices"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c["message"]["content"].as_str())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| DescribeError::ProviderError("response carried no text".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::HttpVisionProvider;

    #[test]
    fn data_url_detects_png() {
        // PNG magic header is enough for format sniffing.
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0];
        let url = HttpVisionProvider::data_url(&png);
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn unknown_bytes_fall_back_to_png_mime() {
        let url = HttpVisionProvider::data_url(&[1, 2, 3, 4]);
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn invalid_endpoint_is_rejected_up_front() {
        assert!(HttpVisionProvider::new("test", "not a url", "gpt-4o-mini").is_err());
    }
}
