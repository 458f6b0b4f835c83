mod errors;
mod generation_contract;

pub use errors::{FailureKind, GenerationFailure, LlmError};
pub use generation_contract::{
    CompletionRequest, DEFAULT_TEMPERATURE, GeneratedText, GenerationRequest, GenerationResult,
    GenerationTask, ProviderKind, RequestField,
};
