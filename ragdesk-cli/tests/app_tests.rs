//! End-to-end tests of the application handler with offline services.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ragdesk_agent::AnsweringAgentBuilder;
use ragdesk_cli::{NO_INDEX_MESSAGE, RagApp, Reply};
use ragdesk_core::Role;
use ragdesk_model::MockLlm;
use ragdesk_rag::{
    EmbeddingProvider, FileVectorStore, INDEX_FILE, IndexStatus, RagConfig, RagPipeline,
    RetrieverTool,
};
use serde_json::json;

const DIMS: usize = 32;

/// Counts letters per bucket; identical texts embed identically.
struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> ragdesk_rag::Result<Vec<f32>> {
        let mut v = vec![0.0; DIMS];
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            v[c.to_ascii_lowercase() as usize % DIMS] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "letters-32"
    }
}

fn app(index_dir: PathBuf, model: Arc<MockLlm>) -> RagApp {
    let pipeline = Arc::new(
        RagPipeline::builder()
            .config(RagConfig::builder().chunk_size(80).chunk_overlap(10).build().unwrap())
            .embedding_provider(Arc::new(LetterEmbedder))
            .vector_store(Arc::new(FileVectorStore::new(index_dir)))
            .build()
            .unwrap(),
    );
    let agent = AnsweringAgentBuilder::new("test")
        .model(model)
        .tool(Arc::new(RetrieverTool::new(pipeline.clone())))
        .build()
        .unwrap();
    RagApp::new(pipeline, agent)
}

async fn write_doc(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("baking.txt");
    tokio::fs::write(
        &path,
        "Bread dough needs yeast, flour and water.\n\nKnead the dough, then let it rise for an hour.",
    )
    .await
    .unwrap();
    path
}

#[tokio::test]
async fn asking_before_ingestion_never_calls_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(MockLlm::new("mock").with_response("should not be used"));
    let app = app(dir.path().join("vector_db"), model.clone());

    assert_eq!(app.ask("What rises?").await, Reply::Notice(NO_INDEX_MESSAGE.to_string()));
    assert!(matches!(app.ask_stream("What rises?").await, Err(Reply::Notice(_))));
    assert_eq!(model.call_count(), 0);
    assert!(app.agent().history().await.is_empty());
    assert_eq!(app.status().await, Reply::Status(IndexStatus::Missing));
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(MockLlm::new("mock"));
    let app = app(dir.path().join("vector_db"), model.clone());

    assert!(matches!(app.ask("   ").await, Reply::Notice(_)));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn ingest_then_ask_uses_the_retriever() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(dir.path()).await;
    let model = Arc::new(
        MockLlm::new("mock")
            .with_tool_call("call_1", "pdf_extractor", json!({ "query": "what does dough need" }))
            .with_response("Yeast, flour and water."),
    );
    let app = app(dir.path().join("vector_db"), model.clone());

    let missing = dir.path().join("missing.pdf");
    let Reply::Ingested(report) = app.ingest_paths(&[doc, missing]).await else {
        panic!("ingestion did not succeed");
    };
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].filename, "baking.txt");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].filename.ends_with("missing.pdf"));
    assert!(matches!(app.status().await, Reply::Status(IndexStatus::Ready { .. })));

    let Reply::Answer(answer) = app.ask("What does bread dough need?").await else {
        panic!("expected an answer");
    };
    assert_eq!(answer.text, "Yeast, flour and water.");
    assert!(!answer.sources.is_empty());
    assert!(answer.sources.iter().all(|s| s.starts_with("baking.txt")));

    let requests = model.requests();
    let tool_message = requests[1].messages.last().unwrap();
    assert_eq!(tool_message.role, Role::Tool);
    assert!(tool_message.content.contains("yeast"));
}

#[tokio::test]
async fn unreadable_files_only_is_an_error_and_keeps_no_index() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path().join("vector_db"), Arc::new(MockLlm::new("mock")));

    let reply = app.ingest_paths(&[dir.path().join("nope.pdf")]).await;
    assert!(reply.is_error());
    assert!(matches!(app.ingest_paths(&[]).await, Reply::Notice(_)));
    assert!(!app.pipeline().is_ready().await);
}

#[tokio::test]
async fn clear_removes_the_index_and_reset_forgets_the_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(dir.path()).await;
    let model = Arc::new(MockLlm::new("mock").with_response("It rises for an hour."));
    let app = app(dir.path().join("vector_db"), model.clone());

    assert!(matches!(app.ingest_paths(&[doc]).await, Reply::Ingested(_)));
    assert!(matches!(app.ask("How long does it rise?").await, Reply::Answer(_)));
    assert_eq!(app.agent().history().await.len(), 2);

    assert!(matches!(app.clear().await, Reply::Notice(_)));
    assert_eq!(app.status().await, Reply::Status(IndexStatus::Missing));
    assert_eq!(app.agent().history().await.len(), 2);
    assert_eq!(app.ask("And then?").await, Reply::Notice(NO_INDEX_MESSAGE.to_string()));
    assert_eq!(model.call_count(), 1);

    app.reset_conversation().await;
    assert!(app.agent().history().await.is_empty());
}

#[tokio::test]
async fn corrupted_index_is_treated_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("vector_db");
    let doc = write_doc(dir.path()).await;
    let model = Arc::new(MockLlm::new("mock").with_response("unused"));
    let app = app(location.clone(), model.clone());

    assert!(matches!(app.ingest_paths(&[doc]).await, Reply::Ingested(_)));
    tokio::fs::write(location.join(INDEX_FILE), b"garbage").await.unwrap();

    assert_eq!(app.ask("What rises?").await, Reply::Notice(NO_INDEX_MESSAGE.to_string()));
    assert_eq!(model.call_count(), 0);
    assert!(matches!(app.status().await, Reply::Status(IndexStatus::Corrupted(_))));
}
