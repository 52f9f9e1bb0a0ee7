use std::sync::Arc;

use crate::config::DEFAULT_SYSTEM_PROMPT;
use crate::domain::{ConversationTurn, TextChunk};
use crate::error::{RcaBotError, Result};
use crate::ports::{ChatMessage, ChatModel, ChatRequest};

pub const DEFAULT_ANSWER_TEMPERATURE: f32 = 0.7;

const CONTEXT_PLACEHOLDER: &str = "{context}";

pub struct AnswerGenerator<C>
where
    C: ChatModel + ?Sized,
{
    chat: Arc<C>,
    system_prompt: String,
    temperature: f32,
}

impl<C> AnswerGenerator<C>
where
    C: ChatModel + ?Sized,
{
    pub fn new(chat: Arc<C>) -> Self {
        Self {
            chat,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_ANSWER_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn generate<'a>(
        &self,
        chunks: impl IntoIterator<Item = &'a TextChunk>,
        transcript: &[ConversationTurn],
        utterance: &str,
    ) -> Result<String> {
        let request = self.build_request(chunks, transcript, utterance);
        let answer = self.chat.complete(&request).await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(RcaBotError::Generation(format!(
                "{} returned an empty answer",
                self.chat.model_name()
            )));
        }
        Ok(answer.to_string())
    }

    pub fn build_request<'a>(
        &self,
        chunks: impl IntoIterator<Item = &'a TextChunk>,
        transcript: &[ConversationTurn],
        utterance: &str,
    ) -> ChatRequest {
        let context = chunks
            .into_iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let system = if self.system_prompt.contains(CONTEXT_PLACEHOLDER) {
            self.system_prompt.replace(CONTEXT_PLACEHOLDER, &context)
        } else {
            format!("{}\n\n{context}", self.system_prompt)
        };

        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(transcript.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(utterance));

        ChatRequest::new(messages, self.temperature)
    }
}
