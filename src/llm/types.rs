use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionEvent {
    Starting,
    Uploading { filename: String },
    DraftingResponse,
    ProcessingResponse,
    Validating { attempt: usize },
    CorrectionNeeded { reason: String },
    Patching { attempt: usize },
    Success { periods: usize },
    Failed { reason: String },
}

/// A file accepted by the Gemini Files API and ready to be referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub uri: String,
    pub name: String,
    pub display_name: String,
    pub mime_type: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Files first, then the instruction text.
    pub fn user_with_files(text: impl Into<String>, documents: &[RemoteDocument]) -> Self {
        let mut parts: Vec<Part> = documents
            .iter()
            .map(|doc| Part::FileData {
                file_data: FileData {
                    mime_type: doc.mime_type.clone(),
                    file_uri: doc.uri.clone(),
                },
            })
            .collect();
        parts.push(Part::Text { text: text.into() });

        Self {
            role: "user".to_string(),
            parts,
        }
    }

    pub fn user_with_inline(text: impl Into<String>, mime_type: &str, base64_data: String) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: base64_data,
                    },
                },
                Part::Text { text: text.into() },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

/// One question/answer pair kept by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("hello")],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: None,
                temperature: Some(0.2),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json.get("systemInstruction").is_none());
        assert!(json["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_file_parts_precede_text() {
        let doc = RemoteDocument {
            uri: "https://files/abc".to_string(),
            name: "files/abc".to_string(),
            display_name: "fy2023.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            state: "ACTIVE".to_string(),
        };
        let content = Content::user_with_files("extract", &[doc]);
        let json = serde_json::to_value(&content).unwrap();

        assert_eq!(json["parts"][0]["fileData"]["fileUri"], "https://files/abc");
        assert_eq!(json["parts"][0]["fileData"]["mimeType"], "application/pdf");
        assert_eq!(json["parts"][1]["text"], "extract");
    }

    #[test]
    fn test_response_parses() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{}"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let candidates = response.candidates.unwrap();
        assert!(matches!(&candidates[0].content.parts[0], Part::Text { text } if text == "{}"));
    }
}
