//! releve-llm: statement structuring through a hosted language model

pub mod config;
pub mod error;
pub mod prompt;
pub mod structurer;

pub use config::{Provider, StructurerConfig};
pub use error::StructuringError;
pub use structurer::{LlmStructurer, StatementStructurer, parse_content};
