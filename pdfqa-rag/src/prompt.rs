//! Prompt template rendering for grounded answers.

use crate::error::{RagError, Result};

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

/// Instructs the model to answer only from the supplied context.
pub const DEFAULT_TEMPLATE: &str = "[INST]
You are a helpful assistant. Use the following pieces of context to answer the user's question accurately.
If you don't know the answer from the provided context, just say that you don't know the answer based on the available documents, don't try to make up an answer.
Provide a concise and to-the-point answer.

Context:
{context}

Question:
{question}

Helpful Answer:
[/INST]";

/// A template with exactly one `{context}` and one `{question}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Validate and wrap `template`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] unless both placeholders occur exactly once.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT, QUESTION] {
            let occurrences = template.matches(placeholder).count();
            if occurrences != 1 {
                return Err(RagError::ConfigError(format!(
                    "prompt template must contain {placeholder} exactly once, found {occurrences}"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute the context and the question.
    ///
    /// Substitution happens in a single pass over the template, so braces
    /// inside `context` or `question` are never re-interpreted.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(CONTEXT) {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION) {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_is_valid() {
        assert!(PromptTemplate::new(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn placeholders_must_appear_once() {
        assert!(PromptTemplate::new("Only {context}").is_err());
        assert!(PromptTemplate::new("{context} {question} {question}").is_err());
        assert!(PromptTemplate::new("Q: {question}\nC: {context}").is_ok());
    }

    #[test]
    fn render_does_not_expand_placeholders_in_values() {
        let template = PromptTemplate::new("C={context} Q={question} {other}").unwrap();
        let rendered = template.render("has {question} inside", "why?");
        assert_eq!(rendered, "C=has {question} inside Q=why? {other}");
    }

    #[test]
    fn default_render_contains_both_parts() {
        let rendered = PromptTemplate::default().render("Alpha facts", "What is alpha?");
        assert!(rendered.contains("Context:\nAlpha facts"));
        assert!(rendered.contains("Question:\nWhat is alpha?"));
        assert!(!rendered.contains("{context}"));
    }
}
