//! Document classification
//!
//! Substring filters over title, summary, URL and author decide what the
//! cleanup job deletes; author lists decide what the save job moves. The AI
//! topic filter lives in [`crate::ai`] and is unioned in by the orchestrator.

mod config;
mod matcher;
mod save;
mod source;
mod standard;

pub use config::FilterConfig;
pub use matcher::matches;
pub use save::{collect_save_actions, resolve_save_location, SaveAction};
pub use source::{load_filters, FilterSource};
pub use standard::{document_matches, filter_documents};
