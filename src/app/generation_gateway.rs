use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::domain::{
    CompletionRequest, GeneratedText, GenerationFailure, GenerationRequest, GenerationResult,
    GenerationTask, LlmError, ProviderKind,
};
use crate::infra::llm::{PromptBuilder, ProviderRegistry};

/// Single entry point turning `(task, request, provider)` into a
/// [`GenerationResult`]. Holds no mutable state; clones share the registry's
/// clients.
#[derive(Clone)]
pub struct GenerationGateway {
    registry: ProviderRegistry,
}

impl GenerationGateway {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn generate(
        &self,
        task: GenerationTask,
        request: &GenerationRequest,
        provider: ProviderKind,
    ) -> GenerationResult {
        match self.try_generate(task, request, provider) {
            Ok(generated) => GenerationResult::Success(generated),
            Err(failure) => GenerationResult::Failure(failure),
        }
    }

    fn try_generate(
        &self,
        task: GenerationTask,
        request: &GenerationRequest,
        provider: ProviderKind,
    ) -> Result<GeneratedText, GenerationFailure> {
        let missing = request.missing_fields(task);
        if !missing.is_empty() {
            debug!(task = task.name(), ?missing, "rejected request with missing fields");
            return Err(GenerationFailure::MissingInput { task, missing });
        }

        // Availability is decided before any prompt is rendered or sent.
        let client = self.registry.client_for(provider)?;
        let model = self.registry.model_for(provider).to_string();

        let completion = CompletionRequest {
            model: model.clone(),
            prompt: PromptBuilder::build(task, request),
            max_tokens: task.max_tokens(),
            temperature: Some(task.temperature()),
        };
        debug!(
            task = task.name(),
            provider = provider.id(),
            %model,
            max_tokens = completion.max_tokens,
            "dispatching completion"
        );

        // A panicking client is reported like any other vendor failure.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| client.complete(&completion)))
            .unwrap_or_else(|_| Err(LlmError::internal("provider client panicked")));
        let text = outcome.map_err(|source| {
            warn!(
                task = task.name(),
                provider = provider.id(),
                error = %source,
                "completion failed"
            );
            GenerationFailure::ProviderError { provider, source }
        })?;

        Ok(GeneratedText {
            text,
            provider,
            model,
        })
    }
}
