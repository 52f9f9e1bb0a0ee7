use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::domain::{ConversationTurn, KnowledgeBaseHandle, Retrieval, SessionState};
use crate::error::{RcaBotError, Result};
use crate::ports::{ChatModel, DocumentFetcher, EmbeddingGenerator};
use crate::providers::{self, OpenAiChat, WebFetcher};
use crate::services::{AnswerGenerator, DocumentIngestor, Indexer, RecursiveSplitter, Retriever};

/// One user action. Each action is handled exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ProcessUrl(String),
    Message(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub answer: String,
    pub retrieval: Retrieval,
}

#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Indexed(KnowledgeBaseHandle),
    Replied(TurnReply),
    Ignored,
}

pub struct SessionController<F, E, C>
where
    F: DocumentFetcher + ?Sized,
    E: EmbeddingGenerator + ?Sized,
    C: ChatModel + ?Sized,
{
    ingestor: DocumentIngestor<F>,
    indexer: Indexer<E>,
    retriever: Retriever<C, E>,
    generator: AnswerGenerator<C>,
    knowledge_base_dir: PathBuf,
}

pub type LiveController = SessionController<dyn DocumentFetcher, dyn EmbeddingGenerator, dyn ChatModel>;

impl LiveController {
    /// Wires the web fetcher and the configured providers together.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(WebFetcher::new(&config.fetch)?);
        let embedder = providers::embedder_from_config(config)?;
        let chat: Arc<dyn ChatModel> = Arc::new(OpenAiChat::from_config(config)?);

        Ok(Self::new(
            DocumentIngestor::new(fetcher, RecursiveSplitter::from_config(&config.splitter)?),
            Indexer::new(Arc::clone(&embedder)).with_batch_size(config.embedding.batch_size),
            Retriever::new(Arc::clone(&chat), embedder)
                .with_top_k(config.retrieval.top_k)
                .with_rewrite_temperature(config.chat.rewrite_temperature),
            AnswerGenerator::new(chat)
                .with_system_prompt(config.chat.system_prompt.clone())
                .with_temperature(config.chat.answer_temperature),
            config.knowledge_base_dir.clone(),
        ))
    }
}

impl<F, E, C> SessionController<F, E, C>
where
    F: DocumentFetcher + ?Sized,
    E: EmbeddingGenerator + ?Sized,
    C: ChatModel + ?Sized,
{
    pub const fn new(
        ingestor: DocumentIngestor<F>,
        indexer: Indexer<E>,
        retriever: Retriever<C, E>,
        generator: AnswerGenerator<C>,
        knowledge_base_dir: PathBuf,
    ) -> Self {
        Self {
            ingestor,
            indexer,
            retriever,
            generator,
            knowledge_base_dir,
        }
    }

    pub const fn indexer(&self) -> &Indexer<E> {
        &self.indexer
    }

    pub async fn handle(&self, state: &mut SessionState, event: SessionEvent) -> Result<SessionOutcome> {
        match event {
            SessionEvent::ProcessUrl(url) => {
                let handle = self.process_url(state, &url).await?;
                Ok(SessionOutcome::Indexed(handle.clone()))
            }
            SessionEvent::Message(text) => Ok(self
                .send_message(state, &text)
                .await?
                .map_or(SessionOutcome::Ignored, SessionOutcome::Replied)),
        }
    }

    /// Ingests `url` into the knowledge-base directory and makes the new
    /// index the active one. On failure the session is left as it was.
    pub async fn process_url<'s>(
        &self,
        state: &'s mut SessionState,
        url: &str,
    ) -> Result<&'s KnowledgeBaseHandle> {
        let chunks = self.ingestor.ingest(url).await?;
        let handle = self.indexer.build(chunks, &self.knowledge_base_dir).await?;
        Ok(state.set_active_handle(handle))
    }

    /// Returns the active handle, reopening the last persisted index when
    /// the session has none yet.
    pub async fn ensure_store<'s>(
        &self,
        state: &'s mut SessionState,
    ) -> Result<&'s KnowledgeBaseHandle> {
        if !state.has_store() {
            let handle = self.indexer.open(&self.knowledge_base_dir).await?;
            state.set_active_handle(handle);
        }

        state
            .active_handle()
            .ok_or_else(|| RcaBotError::NotFound(self.knowledge_base_dir.clone()))
    }

    /// Answers one user message. Blank messages are ignored. The user turn
    /// and the answer are appended together, only once the answer exists.
    pub async fn send_message(
        &self,
        state: &mut SessionState,
        text: &str,
    ) -> Result<Option<TurnReply>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let handle = self.ensure_store(state).await?.clone();
        let retrieval = self
            .retriever
            .retrieve(&handle, state.transcript(), text)
            .await?;
        let answer = self
            .generator
            .generate(
                retrieval.chunks.iter().map(|c| &c.chunk),
                state.transcript(),
                text,
            )
            .await?;

        state.record_exchange(text, answer.clone());
        Ok(Some(TurnReply { answer, retrieval }))
    }
}

/// Plain-text transcript, one `Role: text` block per turn.
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        let _ = writeln!(out, "{}: {}", turn.role(), turn.text());
    }
    out
}
