pub mod chat;
pub mod embed;
pub mod fetch;

pub use chat::{ChatMessage, ChatModel, ChatRequest, ChatRole};
pub use embed::EmbeddingGenerator;
pub use fetch::{DocumentFetcher, FetchedDocument};
