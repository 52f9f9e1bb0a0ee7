use std::sync::Arc;

use crate::domain::{ConversationTurn, KnowledgeBaseHandle, Retrieval};
use crate::error::{RcaBotError, Result};
use crate::ports::{ChatMessage, ChatModel, ChatRequest, EmbeddingGenerator};
use crate::store;

pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_REWRITE_TEMPERATURE: f32 = 0.7;

pub const REWRITE_INSTRUCTION: &str = "Given the above conversation, generate a search query to look up in order to get information relevant to the conversation";

pub struct Retriever<C, E>
where
    C: ChatModel + ?Sized,
    E: EmbeddingGenerator + ?Sized,
{
    chat: Arc<C>,
    embedder: Arc<E>,
    top_k: usize,
    rewrite_temperature: f32,
}

impl<C, E> Retriever<C, E>
where
    C: ChatModel + ?Sized,
    E: EmbeddingGenerator + ?Sized,
{
    pub const fn new(chat: Arc<C>, embedder: Arc<E>) -> Self {
        Self {
            chat,
            embedder,
            top_k: DEFAULT_TOP_K,
            rewrite_temperature: DEFAULT_REWRITE_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub const fn with_rewrite_temperature(mut self, temperature: f32) -> Self {
        self.rewrite_temperature = temperature;
        self
    }

    pub async fn retrieve(
        &self,
        handle: &KnowledgeBaseHandle,
        transcript: &[ConversationTurn],
        utterance: &str,
    ) -> Result<Retrieval> {
        let query = self.standalone_query(transcript, utterance).await?;
        let embedding = self.embedder.embed(&query).await?;
        if embedding.len() != handle.manifest().dimension {
            return Err(RcaBotError::Generation(format!(
                "{} embedded the query with {} dimensions, but the knowledge base at {} holds {}-dimensional vectors from {}",
                self.embedder.model_name(),
                embedding.len(),
                handle.location().display(),
                handle.manifest().dimension,
                handle.manifest().embedding_model
            )));
        }
        let chunks = store::rank(handle.records(), &embedding, self.top_k);

        tracing::debug!(
            query = %query,
            scores = ?chunks.iter().map(|c| c.score).collect::<Vec<_>>(),
            "Retrieved {} of {} chunks",
            chunks.len(),
            handle.len()
        );
        Ok(Retrieval { query, chunks })
    }

    /// Rewrites the utterance into a query that stands on its own. With no
    /// history there is nothing to resolve, so the utterance is used as is.
    pub async fn standalone_query(
        &self,
        transcript: &[ConversationTurn],
        utterance: &str,
    ) -> Result<String> {
        if transcript.is_empty() {
            return Ok(utterance.to_string());
        }

        let request = rewrite_request(transcript, utterance, self.rewrite_temperature);
        let rewritten = self.chat.complete(&request).await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            tracing::warn!("Query rewrite came back empty, searching with the raw message");
            return Ok(utterance.to_string());
        }
        Ok(rewritten.to_string())
    }
}

pub fn rewrite_request(
    transcript: &[ConversationTurn],
    utterance: &str,
    temperature: f32,
) -> ChatRequest {
    let mut messages: Vec<ChatMessage> = transcript.iter().map(ChatMessage::from).collect();
    messages.push(ChatMessage::user(utterance));
    messages.push(ChatMessage::user(REWRITE_INSTRUCTION));
    ChatRequest::new(messages, temperature)
}
