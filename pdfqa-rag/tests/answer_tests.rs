//! Retrieval and answering tests with scripted generators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdfqa_rag::{
    AnswerPayload, AnsweringOrchestrator, EmbeddingProvider, HashingEmbeddingProvider,
    InMemoryVectorStore, IngestMode, IngestionPipeline, PromptTemplate, RagConfig, RagError,
    Result, Retriever, StaticSource, TextGenerator, VectorStore,
};

const DIMS: usize = 64;
const COLLECTION: &str = "answers";

/// Returns a fixed reply and remembers the last prompt.
struct ScriptedGenerator {
    reply: std::result::Result<String, String>,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(text.to_string()), last_prompt: Mutex::new(None) })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err(message.to_string()), last_prompt: Mutex::new(None) })
    }

    fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().map_err(|message| RagError::GenerationError {
            provider: "scripted".into(),
            message,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingEmbeddingProvider::new(DIMS).unwrap())
}

async fn indexed_store() -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    let config = RagConfig::builder()
        .chunk_size(80)
        .chunk_overlap(10)
        .embedding_dimensions(DIMS)
        .collection_name(COLLECTION)
        .build()
        .unwrap();
    let source = StaticSource::new()
        .with_document("leave.txt", "Annual leave is twenty days per year.\x0cUnused leave expires in March.")
        .with_document("travel.txt", "Travel must be booked through the internal portal.");
    IngestionPipeline::builder()
        .config(config)
        .embedding_provider(embedder())
        .vector_store(store.clone())
        .build()
        .unwrap()
        .run(&source, IngestMode::Rebuild)
        .await
        .unwrap();
    store
}

fn retriever(store: Arc<InMemoryVectorStore>) -> Retriever {
    Retriever::new(embedder(), store, COLLECTION, 3)
}

#[tokio::test]
async fn zero_k_is_an_invalid_query() {
    let retriever = retriever(indexed_store().await);
    let err = retriever.retrieve("annual leave", 0).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidQuery(_)));
}

#[tokio::test]
async fn retrieval_is_bounded_and_ordered() {
    let retriever = retriever(indexed_store().await);
    let results = retriever.retrieve("how many days of annual leave", 2).await.unwrap();
    assert!(results.len() <= 2);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(results[0].chunk.document, "leave.txt");
    assert_eq!(retriever.count().await.unwrap(), 2);
}

#[tokio::test]
async fn empty_question_is_rejected_before_retrieval() {
    let generator = ScriptedGenerator::replying("unused");
    let orchestrator = AnsweringOrchestrator::new(retriever(indexed_store().await), generator.clone());

    assert!(matches!(orchestrator.answer("").await, Err(RagError::EmptyQuery)));
    assert!(matches!(orchestrator.answer("   \n").await, Err(RagError::EmptyQuery)));
    assert!(generator.last_prompt().is_empty());

    let payload = orchestrator.answer_payload("").await;
    assert_eq!(payload, AnswerPayload::Error { error: "Query cannot be empty".to_string() });
}

#[tokio::test]
async fn answer_cites_retrieved_chunks() {
    let generator = ScriptedGenerator::replying("  Twenty days per year.  ");
    let orchestrator = AnsweringOrchestrator::new(retriever(indexed_store().await), generator.clone());

    let answer = orchestrator.answer("How much annual leave do I get?").await.unwrap();
    assert_eq!(answer.text, "Twenty days per year.");
    assert_eq!(answer.sources.len(), answer.results.len());
    assert_eq!(answer.sources[0].source_name, "leave.txt");
    assert!(answer.sources.iter().all(|c| c.snippet.chars().count() <= 200));

    let prompt = generator.last_prompt();
    assert!(prompt.contains("How much annual leave do I get?"));
    assert!(prompt.contains(&answer.results[0].chunk.text));
}

#[tokio::test]
async fn empty_retrieval_still_answers() {
    let store = Arc::new(InMemoryVectorStore::new());
    let handle = store.open_or_create(COLLECTION, DIMS).await.unwrap();
    let generator = ScriptedGenerator::replying(
        "I don't know the answer based on the available documents.",
    );
    let orchestrator = AnsweringOrchestrator::new(retriever(store.clone()), generator.clone())
        .with_template(PromptTemplate::new("Context: [{context}]\nQuestion: {question}").unwrap());

    let answer = orchestrator.answer("What is X?").await.unwrap();
    assert!(answer.sources.is_empty());
    assert!(answer.text.contains("don't know"));
    assert_eq!(generator.last_prompt(), "Context: []\nQuestion: What is X?");
    assert_eq!(store.count(&handle).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_collection_is_an_error_and_is_not_created() {
    let store = Arc::new(InMemoryVectorStore::new());
    let retriever = Retriever::new(embedder(), store.clone(), "answrs", 3);

    let err = retriever.retrieve("annual leave", 3).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStoreError { .. }));
    assert!(err.to_string().contains("does not exist"));
    assert!(retriever.count().await.is_err());
    assert!(store.open("answrs").await.unwrap().is_none());
}

#[tokio::test]
async fn collection_created_after_first_miss_is_found() {
    let store = Arc::new(InMemoryVectorStore::new());
    let retriever = retriever(store.clone());
    assert!(retriever.retrieve("annual leave", 3).await.is_err());

    store.open_or_create(COLLECTION, DIMS).await.unwrap();
    assert!(retriever.retrieve("annual leave", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn collection_of_other_dimensions_is_rejected() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.open_or_create(COLLECTION, DIMS * 2).await.unwrap();

    let err = retriever(store).retrieve("annual leave", 3).await.unwrap_err();
    assert!(err.to_string().contains("128-dimensional"));
}

#[tokio::test]
async fn generation_failure_becomes_error_payload() {
    let generator = ScriptedGenerator::failing("model unavailable");
    let orchestrator = AnsweringOrchestrator::new(retriever(indexed_store().await), generator);

    assert!(matches!(
        orchestrator.answer("annual leave").await,
        Err(RagError::GenerationError { .. })
    ));

    let payload = orchestrator.answer_payload("annual leave").await;
    assert!(payload.is_error());
    let json = serde_json::to_value(&payload).unwrap();
    assert!(json["error"].as_str().unwrap().contains("model unavailable"));
    assert!(json.get("text").is_none());
}

#[tokio::test]
async fn answer_payload_serializes_text_and_sources() {
    let orchestrator = AnsweringOrchestrator::new(
        retriever(indexed_store().await),
        ScriptedGenerator::replying("Use the internal portal."),
    );
    let payload = orchestrator.answer_payload("How do I book travel?").await;
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["text"], "Use the internal portal.");
    assert!(json["sources"].as_array().unwrap().iter().all(|s| s.get("page").is_some()));
}
