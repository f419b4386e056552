//! Grounded question answering over retrieved chunks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::{META_SOURCE, SearchResult};
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::prompt::PromptTemplate;
use crate::retriever::Retriever;

/// Characters of chunk text kept in a [`Citation`].
pub const SNIPPET_CHARS: usize = 200;

/// Where one piece of supporting context came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Display name of the source document.
    pub source_name: String,
    /// Zero-based page on which the chunk starts.
    pub page: usize,
    /// Leading text of the chunk.
    pub snippet: String,
}

impl Citation {
    fn from_result(result: &SearchResult) -> Self {
        let chunk = &result.chunk;
        Self {
            source_name: chunk
                .metadata
                .get(META_SOURCE)
                .cloned()
                .unwrap_or_else(|| chunk.document.clone()),
            page: chunk.page,
            snippet: chunk.snippet(SNIPPET_CHARS),
        }
    }
}

/// Generated text plus the retrieval it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The model's answer.
    pub text: String,
    /// One citation per retrieved chunk, in ranked order.
    pub sources: Vec<Citation>,
    /// The retrieval itself.
    pub results: Vec<SearchResult>,
}

/// Serializable outcome of [`AnsweringOrchestrator::answer_payload`].
///
/// Serializes as `{"text": ..., "sources": [...]}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerPayload {
    /// A generated answer.
    Answer {
        /// The model's answer.
        text: String,
        /// Citations for the supporting chunks.
        sources: Vec<Citation>,
    },
    /// Why no answer could be produced.
    Error {
        /// Human-readable failure description.
        error: String,
    },
}

impl AnswerPayload {
    /// Whether this payload carries an error.
    pub fn is_error(&self) -> bool {
        matches!(self, AnswerPayload::Error { .. })
    }
}

impl From<Answer> for AnswerPayload {
    fn from(answer: Answer) -> Self {
        AnswerPayload::Answer { text: answer.text, sources: answer.sources }
    }
}

/// Retrieves context for a question, renders the prompt and calls the model.
pub struct AnsweringOrchestrator {
    retriever: Retriever,
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
}

impl AnsweringOrchestrator {
    /// Create an orchestrator using the default answer-only-from-context template.
    pub fn new(retriever: Retriever, generator: Arc<dyn TextGenerator>) -> Self {
        Self { retriever, generator, template: PromptTemplate::default() }
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// The retriever used for context.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `query` from the retrieved context.
    ///
    /// An empty retrieval is not an error: the model receives an empty
    /// context and is instructed to say it does not know.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyQuery`] for an empty or whitespace-only query.
    /// - Retrieval errors and [`RagError::GenerationError`] are propagated.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        if query.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }

        let results = self.retriever.retrieve_default(query).await?;
        let context =
            results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let prompt = self.template.render(&context, query);

        let text = self.generator.generate(&prompt).await?;
        info!(
            generator = self.generator.name(),
            context_chunks = results.len(),
            answer_len = text.len(),
            "answered query"
        );

        let sources = results.iter().map(Citation::from_result).collect();
        Ok(Answer { text: text.trim().to_string(), sources, results })
    }

    /// Like [`answer`](Self::answer), but every failure becomes an
    /// [`AnswerPayload::Error`] instead of an `Err`.
    pub async fn answer_payload(&self, query: &str) -> AnswerPayload {
        match self.answer(query).await {
            Ok(answer) => answer.into(),
            Err(e) => {
                error!(error = %e, "failed to answer query");
                AnswerPayload::Error { error: e.to_string() }
            }
        }
    }
}
