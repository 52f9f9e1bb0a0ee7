//! # rca-bot
//!
//! Retrieval-augmented chatbot for incident root-cause questions: fetch a
//! page, index it, and answer questions grounded in what was indexed.
//!
//! ## Example
//!
//! ```no_run
//! use rca_bot::config::Config;
//! use rca_bot::domain::SessionState;
//! use rca_bot::services::LiveController;
//!
//! # async fn run() -> rca_bot::Result<()> {
//! let config = Config::load()?;
//! let controller = LiveController::from_config(&config)?;
//! let mut session = SessionState::new();
//!
//! controller.process_url(&mut session, "https://example.com/postmortem").await?;
//! if let Some(reply) = controller.send_message(&mut session, "What caused the outage?").await? {
//!     println!("{}", reply.answer);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod providers;
pub mod services;
pub mod store;

pub use error::{RcaBotError, Result};
