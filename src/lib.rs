//! Résumé advice, cover letter, and résumé polishing through interchangeable
//! LLM providers.
//!
//! [`app::GenerationGateway`] validates a request, checks provider
//! availability in [`infra::llm::ProviderRegistry`], renders the task prompt,
//! and issues one completion through the selected vendor adapter.

pub mod app;
pub mod domain;
pub mod infra;
