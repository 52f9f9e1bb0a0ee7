pub mod answer;
pub mod indexer;
pub mod ingestion;
pub mod retrieval;
pub mod session;
pub mod splitter;

pub use answer::AnswerGenerator;
pub use indexer::Indexer;
pub use ingestion::DocumentIngestor;
pub use retrieval::Retriever;
pub use session::{
    LiveController, SessionController, SessionEvent, SessionOutcome, TurnReply, render_transcript,
};
pub use splitter::RecursiveSplitter;
