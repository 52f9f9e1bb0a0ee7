use super::{ConversationTurn, KnowledgeBaseHandle, Role};

pub const GREETING: &str = "Hello, How can I help you?";

/// Conversational state of one interactive session.
///
/// The caller owns it and passes it to the session controller for every
/// action; dropping it ends the session.
#[derive(Debug, Clone)]
pub struct SessionState {
    transcript: Vec<ConversationTurn>,
    active_handle: Option<KnowledgeBaseHandle>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            transcript: vec![ConversationTurn::assistant(GREETING)],
            active_handle: None,
        }
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub const fn active_handle(&self) -> Option<&KnowledgeBaseHandle> {
        self.active_handle.as_ref()
    }

    pub const fn has_store(&self) -> bool {
        self.active_handle.is_some()
    }

    pub fn set_active_handle(&mut self, handle: KnowledgeBaseHandle) -> &KnowledgeBaseHandle {
        self.active_handle.insert(handle)
    }

    /// Appends a completed exchange. Both turns land together or not at all.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.transcript.reserve(2);
        self.transcript.push(ConversationTurn::new(Role::User, question));
        self.transcript
            .push(ConversationTurn::new(Role::Assistant, answer));
    }
}
