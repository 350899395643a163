use crate::error::{AnalysisError, Result};
use crate::llm::types::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::try_join_all;
use log::{debug, info};
use reqwest::{Client, Response};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_UPLOAD_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta/files";

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Images up to this size are sent inline instead of through the Files API.
pub const INLINE_IMAGE_LIMIT: u64 = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Reads `GEMINI_API_KEY` from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            AnalysisError::InvalidConfig("GEMINI_API_KEY is not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    /// `GEMINI_MODEL` if set, otherwise [`DEFAULT_MODEL`].
    pub fn model_from_env() -> String {
        std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
    }

    /// Builds a user message for a small image by embedding it as base64.
    pub async fn inline_image(&self, path: &Path, instruction: &str) -> Result<Content> {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(AnalysisError::ExtractionFailed(format!(
                "{} is not an image ({})",
                path.display(),
                mime
            )));
        }

        let size = fs::metadata(path).await?.len();
        if size > INLINE_IMAGE_LIMIT {
            return Err(AnalysisError::ExtractionFailed(format!(
                "{} is {} bytes, above the inline limit of {}",
                path.display(),
                size,
                INLINE_IMAGE_LIMIT
            )));
        }

        let bytes = fs::read(path).await?;
        Ok(Content::user_with_inline(
            instruction,
            mime.essence_str(),
            STANDARD.encode(bytes),
        ))
    }

    /// Uploads through the resumable Files API and waits until the file is
    /// `ACTIVE`.
    pub async fn upload_document(&self, path: &Path) -> Result<RemoteDocument> {
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AnalysisError::ExtractionFailed("Invalid file name".to_string()))?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let bytes = fs::read(path).await?;

        info!("Uploading {} ({} bytes, {})", display_name, bytes.len(), mime_type);

        let session_url = self
            .open_upload_session(display_name, &mime_type, bytes.len())
            .await?;
        let file = self.send_upload(&session_url, bytes).await?;

        let uri = required_str(&file, "uri")?;
        let name = required_str(&file, "name")?;
        let state = self.wait_until_active(&name, file_state(&file)).await?;

        Ok(RemoteDocument {
            uri,
            name,
            display_name: display_name.to_string(),
            mime_type,
            state,
        })
    }

    async fn open_upload_session(
        &self,
        display_name: &str,
        mime_type: &str,
        size: usize,
    ) -> Result<String> {
        let res = self
            .client
            .post(GEMINI_UPLOAD_URL)
            .query(&[("key", &self.api_key)])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let res = ensure_success(res, "Upload session rejected").await?;

        res.headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                AnalysisError::ExtractionFailed("Upload session returned no upload URL".to_string())
            })
    }

    /// Sends the whole file in one chunk and returns the `file` resource.
    async fn send_upload(&self, session_url: &str, bytes: Vec<u8>) -> Result<serde_json::Value> {
        let res = self
            .client
            .post(session_url)
            .header("Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let mut body: serde_json::Value = ensure_success(res, "File upload failed").await?.json().await?;

        body.get_mut("file")
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                AnalysisError::ExtractionFailed("Upload response missing 'file'".to_string())
            })
    }

    async fn wait_until_active(&self, name: &str, mut state: String) -> Result<String> {
        let url = format!("{}/{}", self.base_url, name);
        loop {
            match state.as_str() {
                "ACTIVE" => return Ok(state),
                "FAILED" => {
                    return Err(AnalysisError::ExtractionFailed(format!(
                        "Processing of {} failed",
                        name
                    )))
                }
                _ => sleep(POLL_INTERVAL).await,
            }

            let body: serde_json::Value = self
                .client
                .get(&url)
                .query(&[("key", &self.api_key)])
                .send()
                .await?
                .json()
                .await?;
            state = file_state(body.get("file").unwrap_or(&body));
            debug!("File {} is {}", name, state);
        }
    }

    /// Uploads several files concurrently, preserving input order.
    pub async fn upload_documents<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<RemoteDocument>> {
        try_join_all(paths.iter().map(|p| self.upload_document(p.as_ref()))).await
    }

    pub(crate) async fn generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
        response_mime_type: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: Some(Content::user(system_prompt)),
            generation_config: GenerationConfig {
                response_mime_type: response_mime_type.to_string(),
                response_schema,
                temperature: None,
            },
        };

        let res = self.client.post(&url).json(&payload).send().await?;
        let body: GenerateContentResponse =
            ensure_success(res, "Gemini API error").await?.json().await?;
        first_text(body)
    }
}

async fn ensure_success(res: Response, context: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await?;
    Err(AnalysisError::ExtractionFailed(format!(
        "{} (status {}): {}",
        context, status, body
    )))
}

fn required_str(obj: &serde_json::Value, key: &str) -> Result<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AnalysisError::ExtractionFailed(format!("Upload response missing {}", key))
        })
}

fn file_state(obj: &serde_json::Value) -> String {
    obj.get("state")
        .and_then(|v| v.as_str())
        .unwrap_or("PROCESSING")
        .to_string()
}

pub(crate) fn first_text(body: GenerateContentResponse) -> Result<String> {
    let part = body
        .candidates
        .ok_or_else(|| AnalysisError::ExtractionFailed("No candidates returned".to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::ExtractionFailed("Empty candidates list".to_string()))?
        .content
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::ExtractionFailed("No parts in content".to_string()))?;

    match part {
        Part::Text { text } => Ok(text),
        _ => Err(AnalysisError::ExtractionFailed(
            "Model returned non-text content".to_string(),
        )),
    }
}
