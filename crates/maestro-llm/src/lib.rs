//! Maestro LLM - Model backend abstraction
//!
//! This crate provides the language-model boundary for Maestro:
//! - Message: role-tagged conversation records
//! - Completion: request/response types with token and timing metrics
//! - Provider: the `LlmProvider` trait every backend implements
//! - Ollama: local Ollama chat backend
//! - Mock: scripted provider for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod ollama;
pub mod provider;

pub use completion::{CompletionRequest, CompletionResponse, CompletionTiming, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::LlmProvider;
