use crate::analysis::FinancialAnalysis;
use crate::error::Result;
use crate::llm::client::GeminiClient;
use crate::llm::prompts::{INSIGHTS_INSTRUCTIONS, SYSTEM_PROMPT_ANALYST, SYSTEM_PROMPT_ASSISTANT};
use crate::llm::types::{Content, Exchange};
use crate::report::render_prompt_context;
use log::debug;

/// Number of previous question/answer pairs replayed with each question.
pub const HISTORY_WINDOW: usize = 5;

/// Conversational Q&A over a computed [`FinancialAnalysis`].
pub struct FinancialAssistant {
    client: GeminiClient,
    model: String,
    history: Vec<Exchange>,
}

impl FinancialAssistant {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn reset_conversation(&mut self) {
        self.history.clear();
    }

    pub async fn answer_question(
        &mut self,
        question: &str,
        analysis: &FinancialAnalysis,
    ) -> Result<String> {
        let system = format!(
            "{}\n\n{}",
            SYSTEM_PROMPT_ASSISTANT,
            render_prompt_context(analysis)
        );
        let messages = build_messages(&self.history, question);
        debug!(
            "Asking question with {} message(s) of context",
            messages.len()
        );

        let answer = self
            .client
            .generate_content(&self.model, &system, messages, None, "text/plain")
            .await?;

        remember(
            &mut self.history,
            Exchange {
                question: question.to_string(),
                answer: answer.clone(),
            },
        );
        Ok(answer)
    }

    /// A narrative assessment of the analysis. Does not touch the
    /// conversation history.
    pub async fn insights(&self, analysis: &FinancialAnalysis) -> Result<String> {
        let prompt = format!(
            "As a financial analyst, provide comprehensive insights based on this financial data:\n\n{}\n{}",
            render_prompt_context(analysis),
            INSIGHTS_INSTRUCTIONS
        );

        self.client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_ANALYST,
                vec![Content::user(prompt)],
                None,
                "text/plain",
            )
            .await
    }
}

/// Appends an exchange, dropping any older than [`HISTORY_WINDOW`].
fn remember(history: &mut Vec<Exchange>, exchange: Exchange) {
    history.push(exchange);
    let excess = history.len().saturating_sub(HISTORY_WINDOW);
    history.drain(..excess);
}

fn build_messages(history: &[Exchange], question: &str) -> Vec<Content> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages: Vec<Content> = history[start..]
        .iter()
        .flat_map(|ex| [Content::user(ex.question.clone()), Content::model(ex.answer.clone())])
        .collect();
    messages.push(Content::user(question));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Part;

    fn text(content: &Content) -> &str {
        match &content.parts[0] {
            Part::Text { text } => text,
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn test_history_window() {
        let history: Vec<Exchange> = (0..8)
            .map(|i| Exchange {
                question: format!("q{}", i),
                answer: format!("a{}", i),
            })
            .collect();

        let messages = build_messages(&history, "latest");
        assert_eq!(messages.len(), HISTORY_WINDOW * 2 + 1);
        assert_eq!(text(&messages[0]), "q3");
        assert_eq!(messages[1].role, "model");
        assert_eq!(text(&messages[1]), "a3");
        assert_eq!(text(messages.last().unwrap()), "latest");
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = Vec::new();
        for i in 0..12 {
            remember(
                &mut history,
                Exchange {
                    question: format!("q{}", i),
                    answer: format!("a{}", i),
                },
            );
        }

        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history[0].question, "q7");
        assert_eq!(history[HISTORY_WINDOW - 1].answer, "a11");
    }

    #[test]
    fn test_empty_history() {
        let messages = build_messages(&[], "what is the ROE?");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }
}
