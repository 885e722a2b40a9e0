use serde::Serialize;

use crate::domain::{Chunk, DomainError, Message};

/// Final prompt plus what survived truncation.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledPrompt {
    pub text: String,
    /// Leading chunks of the ranked input that were kept.
    pub chunks_used: usize,
    /// Trailing history turns that were kept.
    pub turns_used: usize,
}

/// Builds the grounded prompt sent to the LLM.
///
/// Layout, sections separated by a blank line:
///
/// ```text
/// <system instruction>
///
/// Context:
/// [1] (chars 0-20)
/// <chunk text>
///
/// [2] (chars 15-32)
/// <chunk text>
///
/// Conversation so far:
/// User: ...
/// Assistant: ...
///
/// Question: <query>
/// Answer:
/// ```
///
/// `Context:` is followed by `(none)` when no chunk is kept, and the
/// conversation section is left out when no turn is kept.
///
/// Length is counted in chars against `max_chars`. While over budget the
/// oldest history turn is dropped; once history is gone the lowest-ranked
/// (last) chunk is dropped. If the instruction and question alone do not fit,
/// assembly fails with [`DomainError::PromptBudgetExceeded`].
pub struct PromptAssembler {
    system: String,
    max_chars: usize,
}

impl PromptAssembler {
    pub fn new(system: impl Into<String>, max_chars: usize) -> Self {
        Self {
            system: system.into(),
            max_chars,
        }
    }

    pub fn assemble(
        &self,
        history: &[Message],
        chunks: &[Chunk],
        query: &str,
    ) -> Result<AssembledPrompt, DomainError> {
        let mut first_turn = 0;
        let mut kept_chunks = chunks.len();

        loop {
            let text = self.render(&history[first_turn..], &chunks[..kept_chunks], query);
            let required = text.chars().count();

            if required <= self.max_chars {
                if first_turn > 0 || kept_chunks < chunks.len() {
                    tracing::debug!(
                        dropped_turns = first_turn,
                        dropped_chunks = chunks.len() - kept_chunks,
                        chars = required,
                        budget = self.max_chars,
                        "prompt truncated"
                    );
                }
                return Ok(AssembledPrompt {
                    text,
                    chunks_used: kept_chunks,
                    turns_used: history.len() - first_turn,
                });
            }

            if first_turn < history.len() {
                first_turn += 1;
            } else if kept_chunks > 0 {
                kept_chunks -= 1;
            } else {
                return Err(DomainError::PromptBudgetExceeded {
                    required,
                    budget: self.max_chars,
                });
            }
        }
    }

    fn render(&self, history: &[Message], chunks: &[Chunk], query: &str) -> String {
        let mut sections = vec![self.system.trim().to_string()];

        let context = if chunks.is_empty() {
            "(none)".to_string()
        } else {
            chunks
                .iter()
                .enumerate()
                .map(|(i, c)| format!("[{}] (chars {}-{})\n{}", i + 1, c.start, c.end, c.text))
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        sections.push(format!("Context:\n{context}"));

        if !history.is_empty() {
            let turns = history
                .iter()
                .map(|m| format!("{}: {}", m.role.as_str(), m.content))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Conversation so far:\n{turns}"));
        }

        sections.push(format!("Question: {query}\nAnswer:"));
        sections.join("\n\n")
    }
}
