pub mod chunk;
pub mod id;
pub mod knowledge_base;
pub mod record;
pub mod search;
pub mod session;
pub mod turn;

pub use chunk::TextChunk;
pub use id::IndexId;
pub use knowledge_base::{IndexManifest, KnowledgeBaseHandle};
pub use record::EmbeddingRecord;
pub use search::{Retrieval, ScoredChunk};
pub use session::{GREETING, SessionState};
pub use turn::{ConversationTurn, Role};
