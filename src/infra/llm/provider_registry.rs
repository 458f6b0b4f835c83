use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{GenerationFailure, LlmError, ProviderKind};

use super::env::read_model;
use super::{AnthropicClient, ClientHandle, CompletionClient, OpenAiClient};

#[derive(Clone)]
enum ProviderEntry {
    Ready { client: ClientHandle, model: String },
    Unavailable { reason: String },
}

/// Per-provider availability, fixed once the registry is built.
///
/// Every [`ProviderKind`] has an entry; providers that were never configured
/// are reported as unavailable.
#[derive(Clone)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderKind, ProviderEntry>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let entries = ProviderKind::ALL
            .into_iter()
            .map(|provider| {
                (
                    provider,
                    ProviderEntry::Unavailable {
                        reason: "provider is not configured".to_string(),
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a client for every provider from process environment. A
    /// provider whose client cannot be built is recorded as unavailable.
    pub fn from_env() -> Self {
        let mut registry = Self::new();
        registry.record(
            ProviderKind::OpenAi,
            OpenAiClient::from_env().map(|client| Arc::new(client) as ClientHandle),
            read_model(ProviderKind::OpenAi),
        );
        registry.record(
            ProviderKind::Anthropic,
            AnthropicClient::from_env().map(|client| Arc::new(client) as ClientHandle),
            read_model(ProviderKind::Anthropic),
        );
        registry
    }

    /// Stores the outcome of constructing a provider's client.
    pub fn record(
        &mut self,
        provider: ProviderKind,
        client: Result<ClientHandle, LlmError>,
        model: Result<String, LlmError>,
    ) {
        match client.and_then(|client| model.map(|model| (client, model))) {
            Ok((client, model)) => self.insert_ready(provider, client, model),
            Err(error) => self.mark_unavailable(provider, error.to_string()),
        }
    }

    pub fn register<C>(&mut self, client: C, model: impl Into<String>) -> Result<(), LlmError>
    where
        C: CompletionClient + 'static,
    {
        self.register_shared(Arc::new(client), model)
    }

    pub fn register_shared(
        &mut self,
        client: ClientHandle,
        model: impl Into<String>,
    ) -> Result<(), LlmError> {
        let provider = client.provider();
        let model = model.into();
        let model = model.trim();
        if model.is_empty() {
            return Err(LlmError::validation(format!(
                "model for provider '{}' must not be empty",
                provider.id()
            )));
        }

        self.insert_ready(provider, client, model.to_string());
        Ok(())
    }

    pub fn mark_unavailable(&mut self, provider: ProviderKind, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(provider = provider.id(), %reason, "provider unavailable");
        self.entries
            .insert(provider, ProviderEntry::Unavailable { reason });
    }

    pub fn is_available(&self, provider: ProviderKind) -> bool {
        matches!(self.entries.get(&provider), Some(ProviderEntry::Ready { .. }))
    }

    pub fn client_for(&self, provider: ProviderKind) -> Result<ClientHandle, GenerationFailure> {
        match self.entries.get(&provider) {
            Some(ProviderEntry::Ready { client, .. }) => Ok(Arc::clone(client)),
            Some(ProviderEntry::Unavailable { reason }) => {
                Err(GenerationFailure::ProviderUnavailable {
                    provider,
                    reason: reason.clone(),
                })
            }
            None => Err(GenerationFailure::ProviderUnavailable {
                provider,
                reason: "provider is not configured".to_string(),
            }),
        }
    }

    /// Model used for `provider`; the provider default when unavailable.
    pub fn model_for(&self, provider: ProviderKind) -> &str {
        match self.entries.get(&provider) {
            Some(ProviderEntry::Ready { model, .. }) => model.as_str(),
            _ => provider.default_model(),
        }
    }

    pub fn unavailable_reason(&self, provider: ProviderKind) -> Option<&str> {
        match self.entries.get(&provider) {
            Some(ProviderEntry::Unavailable { reason }) => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn available_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|provider| self.is_available(*provider))
            .collect()
    }

    fn insert_ready(&mut self, provider: ProviderKind, client: ClientHandle, model: String) {
        info!(provider = provider.id(), %model, "provider ready");
        self.entries
            .insert(provider, ProviderEntry::Ready { client, model });
    }
}
