use thiserror::Error;

use super::{GenerationTask, ProviderKind, RequestField};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("provider authentication failed")]
    Auth,
    #[error("provider rate limit or quota reached")]
    RateLimited,
    #[error("provider request timed out")]
    Timeout,
    #[error("provider returned an invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("provider transport failed: {message}")]
    Transport { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl LlmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Machine-checkable classification of a failed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingInput,
    ProviderUnavailable,
    ProviderError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("{task} request is missing required fields")]
    MissingInput {
        task: GenerationTask,
        missing: Vec<RequestField>,
    },
    #[error("{provider} is unavailable: {reason}")]
    ProviderUnavailable {
        provider: ProviderKind,
        reason: String,
    },
    #[error("{provider} request failed: {source}")]
    ProviderError {
        provider: ProviderKind,
        #[source]
        source: LlmError,
    },
}

impl GenerationFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingInput { .. } => FailureKind::MissingInput,
            Self::ProviderUnavailable { .. } => FailureKind::ProviderUnavailable,
            Self::ProviderError { .. } => FailureKind::ProviderError,
        }
    }

    /// Text shown to the end user in place of generated output.
    pub fn message(&self) -> String {
        match self {
            Self::MissingInput { missing, .. } => {
                let labels = missing
                    .iter()
                    .map(|field| field.label())
                    .collect::<Vec<_>>();
                format!("Please fill in {} before submitting.", join_labels(&labels))
            }
            Self::ProviderUnavailable { provider, reason } => format!(
                "{name} is not properly configured: {reason}. Set {env} in your environment or .env file.",
                name = provider.display_name(),
                env = provider.api_key_env(),
            ),
            Self::ProviderError { provider, source } => format!(
                "Error with {name} API: {source}\n\nPlease check:\n1. Your {env} in .env file\n2. You have credits in your {name} account\n3. Internet connection",
                name = provider.display_name(),
                env = provider.api_key_env(),
            ),
        }
    }
}

fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => "all fields".to_string(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
