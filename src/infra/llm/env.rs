use std::time::Duration;

use crate::domain::{LlmError, ProviderKind};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub(crate) const ENV_GLOBAL_TIMEOUT_SECS: &str = "CAREERKIT_LLM_TIMEOUT_SECS";

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, LlmError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(LlmError::validation(format!(
            "{name} could not be read: {error}"
        ))),
    }
}

pub(crate) fn read_api_key(provider: ProviderKind) -> Result<String, LlmError> {
    resolve_api_key(provider, read_env_var)
}

/// Scoped variable first, then the conventional one. Blank values count as unset.
pub(crate) fn resolve_api_key<F>(provider: ProviderKind, read_var: F) -> Result<String, LlmError>
where
    F: Fn(&str) -> Result<Option<String>, LlmError>,
{
    let scoped = provider.scoped_api_key_env();
    let conventional = provider.api_key_env();
    for name in [scoped, conventional] {
        if let Some(key) = read_var(name)?
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
    }

    Err(LlmError::validation(format!(
        "{} API key is missing (set {scoped} or {conventional})",
        provider.display_name()
    )))
}

pub(crate) fn read_model(provider: ProviderKind) -> Result<String, LlmError> {
    Ok(read_env_var(provider.model_env())?
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .unwrap_or_else(|| provider.default_model().to_string()))
}

pub(crate) fn parse_timeout_seconds(name: &str, value: &str) -> Result<Duration, LlmError> {
    let parsed = value.trim().parse::<u64>().map_err(|_| {
        LlmError::validation(format!("{name} must be a positive integer in seconds"))
    })?;
    if parsed == 0 {
        return Err(LlmError::validation(format!(
            "{name} must be greater than 0 seconds"
        )));
    }
    Ok(Duration::from_secs(parsed))
}

pub(crate) fn read_timeout_from_env(name: &str) -> Result<Option<Duration>, LlmError> {
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    Ok(Some(parse_timeout_seconds(name, &value)?))
}

pub(crate) fn resolve_timeout_with_global_fallback<F>(
    provider_timeout: Option<Duration>,
    read_global_timeout: F,
    default_timeout: Duration,
) -> Result<Duration, LlmError>
where
    F: FnOnce() -> Result<Option<Duration>, LlmError>,
{
    if let Some(timeout) = provider_timeout {
        return Ok(timeout);
    }

    Ok(read_global_timeout()?.unwrap_or(default_timeout))
}

/// Resolves the HTTP timeout for a provider from its own variable, then the
/// global variable, then [`DEFAULT_TIMEOUT`].
pub(crate) fn read_provider_timeout(provider_env: &str) -> Result<Duration, LlmError> {
    let provider_timeout = read_timeout_from_env(provider_env)?;
    resolve_timeout_with_global_fallback(
        provider_timeout,
        || read_timeout_from_env(ENV_GLOBAL_TIMEOUT_SECS),
        DEFAULT_TIMEOUT,
    )
}
