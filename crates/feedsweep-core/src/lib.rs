pub mod ai;
pub mod cleanup;
pub mod config;
pub mod dates;
pub mod document;
pub mod error;
pub mod filter;
pub mod reader;
pub mod report;
pub mod retry;
pub mod run;
pub mod save;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{Error, Result};
