//! End-to-end session behaviour with in-memory providers.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rca_bot::domain::{GREETING, Role, SessionState};
use rca_bot::ports::{
    ChatModel, ChatRequest, DocumentFetcher, EmbeddingGenerator, FetchedDocument,
};
use rca_bot::services::retrieval::REWRITE_INSTRUCTION;
use rca_bot::services::{
    AnswerGenerator, DocumentIngestor, Indexer, RecursiveSplitter, Retriever, SessionController,
    SessionEvent, SessionOutcome,
};
use rca_bot::{RcaBotError, Result};
use tempfile::TempDir;

const POSTMORTEM: &str = "Summary\n\nAt 09:12 the API gateway started returning 502s.\n\n\
Root cause\n\nThe TLS certificate on the load balancer expired overnight.\n\n\
Remediation\n\nThe certificate was renewed and rotation was automated.\n\n\
Follow-up\n\nAlerting on certificate expiry was added for every environment.";

struct MemoryFetcher;

#[async_trait]
impl DocumentFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let text = if url.ends_with("/empty") {
            String::new()
        } else if url.ends_with("/short") {
            "The database ran out of connections.".to_string()
        } else {
            POSTMORTEM.to_string()
        };
        Ok(FetchedDocument {
            url: url.to_string(),
            title: Some("Postmortem".to_string()),
            content_type: Some("text/plain".to_string()),
            text,
        })
    }
}

/// Counts letters into 26 buckets.
struct LetterEmbedder;

#[async_trait]
impl EmbeddingGenerator for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; 26];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            let bucket = (c.to_ascii_lowercase() as u8 - b'a') as usize;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> Option<usize> {
        Some(26)
    }

    fn model_name(&self) -> &str {
        "letters"
    }
}

/// Rewrites to the latest user message and answers from the system context.
#[derive(Default)]
struct ScriptedChat {
    failing: AtomicBool,
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RcaBotError::Generation("provider unavailable".to_string()));
        }

        let last = request.messages.last().map(|m| m.content.as_str());
        if last == Some(REWRITE_INSTRUCTION) {
            let utterance = &request.messages[request.messages.len() - 2].content;
            return Ok(format!("{utterance} certificate"));
        }

        let context_included = request
            .messages
            .first()
            .is_some_and(|m| m.content.contains("certificate"));
        Ok(if context_included {
            "The load balancer certificate expired.".to_string()
        } else {
            "I don't know.".to_string()
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

type TestController = SessionController<MemoryFetcher, LetterEmbedder, ScriptedChat>;

struct Harness {
    _dir: TempDir,
    kb_dir: PathBuf,
    chat: Arc<ScriptedChat>,
    controller: TestController,
}

fn harness_with_top_k(top_k: usize) -> Harness {
    let dir = TempDir::new().unwrap();
    let kb_dir = dir.path().join("vector_data_openAI");
    let chat = Arc::new(ScriptedChat::default());
    let embedder = Arc::new(LetterEmbedder);

    let controller = SessionController::new(
        DocumentIngestor::new(Arc::new(MemoryFetcher), RecursiveSplitter::new(80, 10).unwrap()),
        Indexer::new(Arc::clone(&embedder)),
        Retriever::new(Arc::clone(&chat), embedder).with_top_k(top_k),
        AnswerGenerator::new(Arc::clone(&chat)),
        kb_dir.clone(),
    );

    Harness {
        _dir: dir,
        kb_dir,
        chat,
        controller,
    }
}

fn harness() -> Harness {
    harness_with_top_k(4)
}

#[tokio::test]
async fn process_then_ask_grows_transcript_in_order() {
    let h = harness();
    let mut session = SessionState::new();

    h.controller
        .process_url(&mut session, "https://example.com/postmortem")
        .await
        .unwrap();
    let reply = h
        .controller
        .send_message(&mut session, "What caused the outage?")
        .await
        .unwrap()
        .unwrap();

    assert!(!reply.answer.is_empty());
    assert_eq!(reply.retrieval.len(), 4);

    let turns = session.transcript();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].role(), Role::Assistant);
    assert_eq!(turns[0].text(), GREETING);
    assert_eq!(turns[1].role(), Role::User);
    assert_eq!(turns[1].text(), "What caused the outage?");
    assert_eq!(turns[2].role(), Role::Assistant);
    assert_eq!(turns[2].text(), reply.answer);
}

#[tokio::test]
async fn empty_url_leaves_session_untouched() {
    let h = harness();
    let mut session = SessionState::new();

    let result = h.controller.process_url(&mut session, "").await;
    assert!(matches!(result, Err(RcaBotError::Fetch(_))));
    assert!(!session.has_store());
    assert!(!h.kb_dir.exists());
}

#[tokio::test]
async fn empty_document_keeps_previous_index_active() {
    let h = harness();
    let mut session = SessionState::new();

    h.controller
        .process_url(&mut session, "https://example.com/postmortem")
        .await
        .unwrap();
    let before = session.active_handle().unwrap().manifest().clone();

    let result = h
        .controller
        .process_url(&mut session, "https://example.com/empty")
        .await;
    assert!(matches!(result, Err(RcaBotError::EmptyDocument(_))));
    assert_eq!(session.active_handle().unwrap().manifest(), &before);
}

#[tokio::test]
async fn message_without_any_index_is_not_found() {
    let h = harness();
    let mut session = SessionState::new();

    let result = h
        .controller
        .send_message(&mut session, "What caused the outage?")
        .await;
    assert!(matches!(result, Err(RcaBotError::NotFound(_))));
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn fresh_session_reopens_persisted_index() {
    let h = harness();
    let mut first = SessionState::new();
    h.controller
        .process_url(&mut first, "https://example.com/postmortem")
        .await
        .unwrap();

    let mut second = SessionState::new();
    assert!(!second.has_store());
    let reply = h
        .controller
        .send_message(&mut second, "Why did the gateway fail?")
        .await
        .unwrap()
        .unwrap();

    assert!(second.has_store());
    assert_eq!(
        second.active_handle().unwrap().manifest(),
        first.active_handle().unwrap().manifest()
    );
    assert_eq!(reply.answer, "The load balancer certificate expired.");
}

#[tokio::test]
async fn reopened_index_retrieves_identically() {
    let h = harness();
    let mut session = SessionState::new();
    h.controller
        .process_url(&mut session, "https://example.com/postmortem")
        .await
        .unwrap();

    let indexer = h.controller.indexer();
    let a = indexer.open(&h.kb_dir).await.unwrap();
    let b = indexer.open(&h.kb_dir).await.unwrap();

    let retriever = Retriever::new(Arc::clone(&h.chat), Arc::new(LetterEmbedder));
    let transcript = session.transcript();
    let from_a = retriever.retrieve(&a, transcript, "expired certificate").await.unwrap();
    let from_b = retriever.retrieve(&b, transcript, "expired certificate").await.unwrap();

    assert_eq!(from_a.query, from_b.query);
    assert_eq!(from_a.chunks, from_b.chunks);
}

#[tokio::test]
async fn retrieval_returns_at_most_available_chunks() {
    let h = harness_with_top_k(4);
    let mut session = SessionState::new();
    let handle = h
        .controller
        .process_url(&mut session, "https://example.com/short")
        .await
        .unwrap();
    assert_eq!(handle.len(), 1);

    let reply = h
        .controller
        .send_message(&mut session, "Why did connections run out?")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.retrieval.len(), 1);
}

#[tokio::test]
async fn failed_generation_leaves_transcript_unchanged() {
    let h = harness();
    let mut session = SessionState::new();
    h.controller
        .process_url(&mut session, "https://example.com/postmortem")
        .await
        .unwrap();

    h.chat.failing.store(true, Ordering::SeqCst);
    let result = h
        .controller
        .send_message(&mut session, "What caused the outage?")
        .await;
    assert!(matches!(result, Err(RcaBotError::Generation(_))));
    assert_eq!(session.transcript().len(), 1);

    h.chat.failing.store(false, Ordering::SeqCst);
    h.controller
        .send_message(&mut session, "What caused the outage?")
        .await
        .unwrap();
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn blank_message_is_ignored() {
    let h = harness();
    let mut session = SessionState::new();

    let outcome = h
        .controller
        .handle(&mut session, SessionEvent::Message("   ".to_string()))
        .await
        .unwrap();
    assert!(matches!(outcome, SessionOutcome::Ignored));
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn processing_a_new_url_replaces_the_active_index() {
    let h = harness();
    let mut session = SessionState::new();

    let outcome = h
        .controller
        .handle(
            &mut session,
            SessionEvent::ProcessUrl("https://example.com/postmortem".to_string()),
        )
        .await
        .unwrap();
    let SessionOutcome::Indexed(first) = outcome else {
        panic!("expected an index");
    };

    h.controller
        .process_url(&mut session, "https://example.com/short")
        .await
        .unwrap();
    let active = session.active_handle().unwrap();
    assert_ne!(active.manifest().id, first.manifest().id);
    assert_eq!(active.manifest().source_url, "https://example.com/short");
    assert_eq!(active.len(), 1);
}
