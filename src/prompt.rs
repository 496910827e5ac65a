//! Prompt assembly for the answer generator.

use serde::{Deserialize, Serialize};

/// Substituted when generation fails or produces an empty answer.
pub const FALLBACK_ANSWER: &str = "I don't know.";

/// Toggles for the system instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptOptions {
    /// Tell the model to admit when the context is insufficient.
    pub strict: bool,
    /// Tell the model to list the sources it used.
    pub cite: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            strict: true,
            cite: true,
        }
    }
}

/// Build the system instruction.
#[must_use]
pub fn system_instruction(options: PromptOptions) -> String {
    let mut base = String::from(
        "You are an assistant answering questions about internal documents. \
         Keep answers brief and to the point.",
    );
    if options.strict {
        base.push_str(" If the provided information is insufficient, say so honestly.");
    }
    if options.cite {
        base.push_str(" List the sources you used from the provided fragments.");
    }
    base
}

/// Build the full generation prompt. Context fragments are separated by a
/// `---` line; with no contexts the fragments block is simply empty.
#[must_use]
pub fn build_user_prompt(question: &str, contexts: &[String], system_instruction: &str) -> String {
    let ctx = contexts.join("\n---\n");
    format!("{system_instruction}\n\nQuestion: {question}\n\nContext fragments:\n{ctx}\n\nAnswer:")
}
