//! Gemini (Google Generative Language API) LLM provider.

use super::config::DEFAULT_BASE_URL;
use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Gemini API provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Create a new GeminiProvider with the given API key and model.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API root (proxies, local emulators).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Gemini API request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Error response from the Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

/// Pull the completion text out of a successful response body.
fn extract_text(body: &str) -> Result<String, LlmError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(LlmError::EmptyResponse(format!("prompt blocked: {}", reason)));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(LlmError::EmptyResponse("no candidates".to_string()));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "no text parts".to_string());
        return Err(LlmError::EmptyResponse(reason));
    }

    Ok(text)
}

/// Turn a non-success status and body into an [`LlmError`].
fn error_from_status(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<GeminiErrorResponse>(&body) {
        Ok(error_response) => LlmError::ApiError {
            status,
            message: error_response.error.message,
        },
        Err(_) => LlmError::ApiError {
            status,
            message: body,
        },
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(error_from_status(status, body));
        }

        extract_text(&body)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new("key".to_string(), "gemini-1.5-flash".to_string())
            .with_base_url("http://localhost:9999/v1beta".to_string());
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some("hello".to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(extract_text(body).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn test_extract_text_no_text_uses_finish_reason() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse(ref m) if m == "MAX_TOKENS"));
    }

    #[test]
    fn test_extract_text_malformed_body() {
        let err = extract_text("<html>oops</html>").unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[test]
    fn test_error_from_status_parses_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        let err = error_from_status(400, body.to_string());
        assert!(matches!(
            err,
            LlmError::ApiError { status: 400, ref message } if message == "API key not valid"
        ));
    }

    #[test]
    fn test_error_from_status_falls_back_to_body() {
        let err = error_from_status(503, "upstream unavailable".to_string());
        assert!(matches!(
            err,
            LlmError::ApiError { status: 503, ref message } if message == "upstream unavailable"
        ));
    }

    /// Serve a single canned HTTP response on a local port and hand back the
    /// provider base URL plus the head of the request that was received.
    async fn serve_once(
        status_line: &'static str,
        extra_headers: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (head_tx, head_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_request(&mut socket).await;
            let _ = head_tx.send(head);

            let response = format!(
                concat!(
                    "HTTP/1.1 {}\r\n",
                    "content-type: application/json\r\n",
                    "content-length: {}\r\n",
                    "connection: close\r\n",
                    "{}\r\n{}"
                ),
                status_line,
                body.len(),
                extra_headers,
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{}/v1beta", addr), head_rx)
    }

    /// Read one request (head and content-length body), returning the head.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                return head;
            }
        }
        String::from_utf8_lossy(&buf).to_lowercase()
    }

    fn provider_at(base_url: String) -> GeminiProvider {
        GeminiProvider::new("test-key".to_string(), "gemini-test".to_string())
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_complete_returns_candidate_text() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{\"ok\": true}"}]}}]}"#;
        let (base_url, head_rx) = serve_once("200 OK", "", body).await;

        let text = provider_at(base_url).complete("make soup").await.unwrap();
        assert_eq!(text, "{\"ok\": true}");

        let head = head_rx.await.unwrap();
        assert!(head.starts_with("post /v1beta/models/gemini-test:generatecontent "));
        assert!(head.contains("x-goog-api-key: test-key"));
    }

    #[tokio::test]
    async fn test_complete_rate_limited_reads_retry_after() {
        let (base_url, _head_rx) =
            serve_once("429 Too Many Requests", "retry-after: 7\r\n", "{}").await;

        let err = provider_at(base_url).complete("make soup").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::RateLimited {
                retry_after_secs: Some(7)
            }
        ));
    }

    #[tokio::test]
    async fn test_complete_error_status_uses_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        let (base_url, _head_rx) = serve_once("400 Bad Request", "", body).await;

        let err = provider_at(base_url).complete("make soup").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::ApiError { status: 400, ref message } if message == "API key not valid"
        ));
    }

    #[tokio::test]
    async fn test_complete_connection_refused_is_request_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider_at(format!("http://{}/v1beta", addr))
            .complete("make soup")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed(_)));
    }
}
