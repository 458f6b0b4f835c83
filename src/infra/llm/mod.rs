mod anthropic;
mod client;
mod env;
mod openai;
pub mod prompt_builder;
mod provider_registry;
mod response_parsing;

pub use anthropic::AnthropicClient;
pub use client::{ClientHandle, CompletionClient};
pub use openai::OpenAiClient;
pub use prompt_builder::PromptBuilder;
pub use provider_registry::ProviderRegistry;

pub(crate) use response_parsing::truncate_chars;
