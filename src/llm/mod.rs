//! LLM client abstraction layer
//!
//! The generation agent is reached through the [`LLMClient`] trait so the
//! pipeline can run against a real provider ([`GenAIClient`]) or a canned
//! queue of answers ([`MockLLMClient`]).

mod client;
mod error;
mod genai;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use self::genai::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
