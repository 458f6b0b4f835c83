use std::sync::Arc;

use crate::domain::{CompletionRequest, LlmError, ProviderKind};

/// A vendor adapter able to issue one single-turn completion.
pub trait CompletionClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

pub type ClientHandle = Arc<dyn CompletionClient>;
