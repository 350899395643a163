use crate::error::{AnalysisError, Result};
use crate::llm::prompts::{SYSTEM_PROMPT_EXTRACTION, SYSTEM_PROMPT_JSON_REPAIR};
use crate::llm::{client::GeminiClient, types::*};
use crate::schema::FinancialFields;
use json_patch::Patch;
use log::{info, warn};
use serde_json::Value;
use std::path::Path;
use tokio::sync::mpsc::Sender;

const MAX_ATTEMPTS: usize = 3;

/// Turns uploaded statements into one [`FinancialFields`] per reporting
/// period, oldest first.
pub struct FinancialExtractor {
    client: GeminiClient,
    model: String,
    system_prompt: String,
}

impl FinancialExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system_prompt: SYSTEM_PROMPT_EXTRACTION.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub async fn extract(
        &self,
        documents: &[RemoteDocument],
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Vec<FinancialFields>> {
        let mut manifest = String::from("Documents:\n");
        for (i, doc) in documents.iter().enumerate() {
            manifest.push_str(&format!("{}. \"{}\"\n", i + 1, doc.display_name));
        }
        self.run(Content::user_with_files(self.instructions(&manifest)?, documents), progress)
            .await
    }

    /// Uploads local files and extracts from them.
    pub async fn extract_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Vec<FinancialFields>> {
        for path in paths {
            let filename = path.as_ref().display().to_string();
            send_event(&progress, ExtractionEvent::Uploading { filename }).await;
        }
        let documents = self.client.upload_documents(paths).await?;
        self.extract(&documents, progress).await
    }

    /// Same as [`extract`](Self::extract) for a message built elsewhere, e.g.
    /// [`GeminiClient::inline_image`].
    pub async fn extract_from_content(
        &self,
        content: Content,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Vec<FinancialFields>> {
        self.run(content, progress).await
    }

    fn instructions(&self, manifest: &str) -> Result<String> {
        Ok(format!(
            "Extract the financial statement figures from the attached files.\n\
            {}\n\
            Each period object must follow this JSON schema:\n{}\n\
            Return ONLY valid JSON.",
            manifest,
            FinancialFields::schema_as_json()?
        ))
    }

    async fn run(
        &self,
        request: Content,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Vec<FinancialFields>> {
        send_event(&progress, ExtractionEvent::Starting).await;
        send_event(&progress, ExtractionEvent::DraftingResponse).await;

        let mut messages = vec![request];
        let raw = self
            .client
            .generate_content(
                &self.model,
                &self.system_prompt,
                messages.clone(),
                None,
                "application/json",
            )
            .await?;

        send_event(&progress, ExtractionEvent::ProcessingResponse).await;

        let mut current: Value = match serde_json::from_str(&clean_json_output(&raw)) {
            Ok(value) => value,
            Err(e) => {
                return fail(&progress, format!("Initial JSON parse failed: {}", e)).await;
            }
        };

        for attempt in 1..=MAX_ATTEMPTS {
            send_event(&progress, ExtractionEvent::Validating { attempt }).await;

            match parse_periods(&current) {
                Ok(periods) => {
                    info!("Extracted {} period(s) on attempt {}", periods.len(), attempt);
                    send_event(
                        &progress,
                        ExtractionEvent::Success {
                            periods: periods.len(),
                        },
                    )
                    .await;
                    return Ok(periods);
                }
                Err(reason) => {
                    warn!("Extraction attempt {} rejected: {}", attempt, reason);
                    send_event(
                        &progress,
                        ExtractionEvent::CorrectionNeeded {
                            reason: reason.clone(),
                        },
                    )
                    .await;
                    if attempt == MAX_ATTEMPTS {
                        break;
                    }
                    send_event(&progress, ExtractionEvent::Patching { attempt }).await;
                    self.apply_patch(&mut messages, &mut current, &reason).await?;
                }
            }
        }

        fail(
            &progress,
            "Max retries exceeded. The model could not produce valid period data.".to_string(),
        )
        .await
    }

    async fn apply_patch(
        &self,
        history: &mut Vec<Content>,
        current_json: &mut Value,
        error_msg: &str,
    ) -> Result<()> {
        let patch_prompt = format!(
            "The JSON you provided failed validation:\n\nERROR: {}\n\n\
            TASK: Return a JSON Patch (RFC 6902) array to fix this. \
            Do NOT return the full JSON. Return ONLY the patch array.\n\
            Example: [{{ \"op\": \"replace\", \"path\": \"/periods/0/revenue\", \"value\": 1000 }}]",
            error_msg
        );

        history.push(Content::model(current_json.to_string()));
        history.push(Content::user(patch_prompt));

        let patch_str = self
            .client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_JSON_REPAIR,
                history.clone(),
                None,
                "application/json",
            )
            .await?;

        let patch: Patch = serde_json::from_str(&clean_json_output(&patch_str))?;
        json_patch::patch(current_json, &patch)?;
        Ok(())
    }
}

async fn send_event(sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event).await;
    }
}

async fn fail<T>(progress: &Option<Sender<ExtractionEvent>>, reason: String) -> Result<T> {
    send_event(
        progress,
        ExtractionEvent::Failed {
            reason: reason.clone(),
        },
    )
    .await;
    Err(AnalysisError::ExtractionFailed(reason))
}

/// Accepts `{"periods": [...]}`, a bare array, or a single period object.
/// Values go through the same normalization as any other input, so "1,200"
/// and "(300)" are understood.
pub(crate) fn parse_periods(value: &Value) -> std::result::Result<Vec<FinancialFields>, String> {
    let items: Vec<&Value> = match value {
        Value::Object(map) => match map.get("periods") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => return Err("'periods' must be an array of objects".to_string()),
            None => vec![value],
        },
        Value::Array(items) => items.iter().collect(),
        _ => return Err("Expected a JSON object with a 'periods' array".to_string()),
    };

    if items.is_empty() {
        return Err("No reporting periods were returned".to_string());
    }

    let mut periods = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let fields = FinancialFields::from_value(item)
            .map_err(|_| format!("Period {} is not a JSON object", idx))?;
        if fields.is_empty() {
            return Err(format!(
                "Period {} contains no recognised numeric fields",
                idx
            ));
        }
        periods.push(fields);
    }
    Ok(periods)
}

pub(crate) fn clean_json_output(raw: &str) -> String {
    let trimmed = raw.trim();
    let array_start = trimmed.find('[');
    let object_start = trimmed.find('{');

    let (open, close) = match (array_start, object_start) {
        (Some(a), Some(o)) if a < o => ('[', ']'),
        (Some(_), None) => ('[', ']'),
        (_, Some(_)) => ('{', '}'),
        (None, None) => return trimmed.to_string(),
    };

    match (trimmed.find(open), trimmed.rfind(close)) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_json_output_strips_fences() {
        let raw = "```json\n{\"periods\": [{\"revenue\": 1}]}\n```";
        assert_eq!(clean_json_output(raw), "{\"periods\": [{\"revenue\": 1}]}");

        let patch = "Here you go: [{\"op\": \"remove\", \"path\": \"/x\"}]";
        assert_eq!(clean_json_output(patch), "[{\"op\": \"remove\", \"path\": \"/x\"}]");

        assert_eq!(clean_json_output("  nothing  "), "nothing");
    }

    #[test]
    fn test_parse_periods_wrapped() {
        let value = json!({
            "periods": [
                {"revenue": "4,000,000", "net_income": 350000},
                {"revenue": 5000000, "net_income": "(20,000)", "inventory": null}
            ]
        });
        let periods = parse_periods(&value).unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].revenue, Some(4_000_000.0));
        assert_eq!(periods[1].net_income, Some(-20_000.0));
        assert_eq!(periods[1].inventory, None);
    }

    #[test]
    fn test_parse_periods_single_object() {
        let periods = parse_periods(&json!({"total_assets": 10})).unwrap();
        assert_eq!(periods[0].total_assets, Some(10.0));
    }

    #[test]
    fn test_parse_periods_rejects_bad_shapes() {
        assert!(parse_periods(&json!("text")).is_err());
        assert!(parse_periods(&json!({"periods": []})).is_err());
        assert!(parse_periods(&json!({"periods": {"revenue": 1}})).is_err());
        assert!(parse_periods(&json!({"periods": [{"notes": "none"}]})).is_err());
        assert!(parse_periods(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_patch_repairs_periods() {
        let mut value = json!({"periods": [{"notes": "n/a"}]});
        assert!(parse_periods(&value).is_err());

        let patch: Patch = serde_json::from_str(
            r#"[{"op": "add", "path": "/periods/0/revenue", "value": 1000}]"#,
        )
        .unwrap();
        json_patch::patch(&mut value, &patch).unwrap();

        assert_eq!(parse_periods(&value).unwrap()[0].revenue, Some(1000.0));
    }
}
