use std::fmt::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{CompletionRequest, ProviderKind};
use crate::infra::llm::{ProviderRegistry, truncate_chars};

const PROBE_PROMPT: &str = "Hi";
const PROBE_MAX_TOKENS: u32 = 5;
const PROBE_ERROR_PREVIEW_CHARS: usize = 100;
const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSection {
    Runtime,
    EnvFile,
    Credentials,
    Providers,
    Connectivity,
}

impl CheckSection {
    fn title(self) -> &'static str {
        match self {
            Self::Runtime => "1. Runtime",
            Self::EnvFile => "2. .env File",
            Self::Credentials => "3. API Keys",
            Self::Providers => "4. Provider Clients",
            Self::Connectivity => "5. API Connections",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupCheck {
    pub section: CheckSection,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub checks: Vec<SetupCheck>,
    pub available_providers: Vec<ProviderKind>,
}

impl SetupReport {
    /// True when at least one provider is fully usable. A provider that is
    /// simply not configured does not block readiness, but a runtime, `.env`
    /// or connectivity failure does.
    pub fn is_ready(&self) -> bool {
        !self.available_providers.is_empty() && self.blocking_checks().next().is_none()
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &SetupCheck> {
        self.checks.iter().filter(|check| !check.passed)
    }

    /// Failed checks that keep the setup from being ready.
    pub fn blocking_checks(&self) -> impl Iterator<Item = &SetupCheck> {
        let credential_found = self
            .checks
            .iter()
            .any(|check| check.section == CheckSection::Credentials && check.passed);

        self.failed_checks().filter(move |check| match check.section {
            CheckSection::Runtime | CheckSection::EnvFile | CheckSection::Connectivity => true,
            CheckSection::Credentials => !credential_found,
            CheckSection::Providers => false,
        })
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let thin_rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}\n  careerkit setup check\n{rule}");

        let mut current_section = None;
        for check in &self.checks {
            if current_section != Some(check.section) {
                current_section = Some(check.section);
                let _ = writeln!(out, "\n{}\n{thin_rule}", check.section.title());
            }
            let mark = if check.passed { "✓" } else { "✗" };
            let _ = writeln!(out, "{mark} {}", check.detail);
        }

        let _ = writeln!(out, "\n{rule}\n  Summary\n{rule}");
        if self.is_ready() {
            let _ = writeln!(out, "Everything is set up correctly!");
            for provider in ProviderKind::ALL {
                if !self.available_providers.contains(&provider) {
                    let _ = writeln!(
                        out,
                        "Note: {} is not configured and cannot be selected.",
                        provider.display_name()
                    );
                }
            }
        } else {
            if self.available_providers.is_empty() {
                let _ = writeln!(
                    out,
                    "No provider is available. Set OPENAI_API_KEY or ANTHROPIC_API_KEY."
                );
            }
            for check in self.blocking_checks() {
                let _ = writeln!(out, "✗ {}", check.detail);
            }
            let _ = writeln!(out, "Please fix the issues above before generating.");
        }
        out
    }
}

type CredentialLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Inspects configuration and, on request, probes each available provider
/// with one minimal completion.
pub struct SetupInspector<'a> {
    registry: &'a ProviderRegistry,
    env_file: PathBuf,
    credential_lookup: CredentialLookup,
}

impl<'a> SetupInspector<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self {
            registry,
            env_file: PathBuf::from(".env"),
            credential_lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    pub fn with_env_file(mut self, env_file: impl Into<PathBuf>) -> Self {
        self.env_file = env_file.into();
        self
    }

    pub fn with_credential_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.credential_lookup = Box::new(lookup);
        self
    }

    pub fn run(&self, probe: bool) -> SetupReport {
        let mut checks = vec![SetupCheck {
            section: CheckSection::Runtime,
            passed: true,
            detail: format!("careerkit {}", env!("CARGO_PKG_VERSION")),
        }];

        checks.push(env_file_check(&self.env_file));

        for provider in ProviderKind::ALL {
            checks.push(self.credential_check(provider));
        }

        for provider in ProviderKind::ALL {
            checks.push(self.availability_check(provider));
        }

        if probe {
            for provider in self.registry.available_providers() {
                checks.push(self.connectivity_check(provider));
            }
        }

        SetupReport {
            checks,
            available_providers: self.registry.available_providers(),
        }
    }

    fn credential_check(&self, provider: ProviderKind) -> SetupCheck {
        let key = [provider.scoped_api_key_env(), provider.api_key_env()]
            .into_iter()
            .filter_map(|name| (self.credential_lookup)(name))
            .find(|key| !key.trim().is_empty());

        let detail = match &key {
            Some(key) => format!(
                "{} API key loaded: {}",
                provider.display_name(),
                mask_secret(key)
            ),
            None => format!(
                "{} API key not found ({})",
                provider.display_name(),
                provider.api_key_env()
            ),
        };

        SetupCheck {
            section: CheckSection::Credentials,
            passed: key.is_some(),
            detail,
        }
    }

    fn availability_check(&self, provider: ProviderKind) -> SetupCheck {
        let detail = match self.registry.unavailable_reason(provider) {
            None => format!(
                "{} client ready (model {})",
                provider.display_name(),
                self.registry.model_for(provider)
            ),
            Some(reason) => format!("{} client unavailable: {reason}", provider.display_name()),
        };

        SetupCheck {
            section: CheckSection::Providers,
            passed: self.registry.is_available(provider),
            detail,
        }
    }

    fn connectivity_check(&self, provider: ProviderKind) -> SetupCheck {
        let request = CompletionRequest {
            model: self.registry.model_for(provider).to_string(),
            prompt: PROBE_PROMPT.to_string(),
            max_tokens: PROBE_MAX_TOKENS,
            temperature: None,
        };
        let outcome = match self.registry.client_for(provider) {
            Ok(client) => client.complete(&request).map_err(|error| error.to_string()),
            Err(failure) => Err(failure.to_string()),
        };

        debug!(provider = provider.id(), ok = outcome.is_ok(), "connectivity probe finished");

        match outcome {
            Ok(_) => SetupCheck {
                section: CheckSection::Connectivity,
                passed: true,
                detail: format!("{} API connection successful", provider.display_name()),
            },
            Err(error) => SetupCheck {
                section: CheckSection::Connectivity,
                passed: false,
                detail: format!(
                    "{} API connection failed: {}",
                    provider.display_name(),
                    preview(&error)
                ),
            },
        }
    }
}

fn env_file_check(path: &Path) -> SetupCheck {
    let found = path.is_file();
    let detail = if found {
        format!("{} file found", path.display())
    } else {
        format!(
            "{} file not found (add OPENAI_API_KEY and/or ANTHROPIC_API_KEY to it, or export them)",
            path.display()
        )
    };

    SetupCheck {
        section: CheckSection::EnvFile,
        passed: found,
        detail,
    }
}

/// Shows the first 10 and last 4 characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars = secret.trim().chars().collect::<Vec<_>>();
    if chars.len() <= 14 {
        return "*".repeat(chars.len());
    }

    let head = chars[..10].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}

fn preview(error: &str) -> String {
    truncate_chars(error, PROBE_ERROR_PREVIEW_CHARS)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{CheckSection, SetupInspector, mask_secret};
    use crate::domain::{CompletionRequest, LlmError, ProviderKind};
    use crate::infra::llm::{CompletionClient, ProviderRegistry};

    struct ProbeClient {
        calls: Arc<AtomicUsize>,
        outcome: Result<String, LlmError>,
    }

    impl CompletionClient for ProbeClient {
        fn provider(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.prompt, "Hi");
            assert_eq!(request.max_tokens, 5);
            self.outcome.clone()
        }
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let values = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| values.get(name).cloned()
    }

    fn registry_with(calls: &Arc<AtomicUsize>, outcome: Result<String, LlmError>) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry
            .register(
                ProbeClient {
                    calls: Arc::clone(calls),
                    outcome,
                },
                "gpt-4o-mini",
            )
            .expect("provider registration should succeed");
        registry
    }

    #[test]
    fn mask_secret_keeps_prefix_and_suffix() {
        assert_eq!(mask_secret("sk-proj-abcdefghijklmnop1234"), "sk-proj-ab...1234");
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn run_without_probe_issues_no_completion() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&calls, Ok("hello".to_string()));

        let report = SetupInspector::new(&registry)
            .with_env_file("definitely-missing.env")
            .with_credential_lookup(lookup(&[("OPENAI_API_KEY", "sk-test-1234567890abcd")]))
            .run(false);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.available_providers, vec![ProviderKind::OpenAi]);
        assert!(
            report
                .checks
                .iter()
                .all(|check| check.section != CheckSection::Connectivity)
        );
        assert!(!report.is_ready());
        assert!(report.render().contains("OpenAI API key loaded: sk-test-12...abcd"));
        assert!(report.render().contains("Claude API key not found (ANTHROPIC_API_KEY)"));
    }

    #[test]
    fn run_with_probe_checks_each_available_provider_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&calls, Ok("hello".to_string()));

        let report = SetupInspector::new(&registry)
            .with_credential_lookup(lookup(&[]))
            .run(true);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let connectivity = report
            .checks
            .iter()
            .filter(|check| check.section == CheckSection::Connectivity)
            .collect::<Vec<_>>();
        assert_eq!(connectivity.len(), 1);
        assert!(connectivity[0].passed);
        assert_eq!(connectivity[0].detail, "OpenAI API connection successful");
    }

    #[test]
    fn probe_failure_is_reported_with_truncated_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let long_error = "x".repeat(300);
        let registry = registry_with(&calls, Err(LlmError::transport(long_error)));

        let report = SetupInspector::new(&registry)
            .with_credential_lookup(lookup(&[]))
            .run(true);

        let probe = report
            .checks
            .iter()
            .find(|check| check.section == CheckSection::Connectivity)
            .expect("probe check should be present");
        assert!(!probe.passed);
        assert!(probe.detail.starts_with("OpenAI API connection failed: "));
        let preview = probe
            .detail
            .trim_start_matches("OpenAI API connection failed: ");
        assert_eq!(preview.chars().count(), 100);
    }

    #[test]
    fn report_is_ready_when_everything_passes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&calls, Ok("hello".to_string()));
        registry
            .register(AnthropicProbe, "claude-sonnet-4-20250514")
            .expect("provider registration should succeed");
        let env_file = std::env::temp_dir().join(format!(
            "careerkit-setup-check-{}.env",
            std::process::id()
        ));
        std::fs::write(&env_file, "OPENAI_API_KEY=sk-test\n").expect("env file should be writable");

        let report = SetupInspector::new(&registry)
            .with_env_file(env_file.clone())
            .with_credential_lookup(lookup(&[
                ("CAREERKIT_OPENAI_API_KEY", "sk-test-1234567890abcd"),
                ("ANTHROPIC_API_KEY", "sk-ant-1234567890abcd"),
            ]))
            .run(true);
        let _ = std::fs::remove_file(&env_file);

        assert!(report.is_ready(), "{}", report.render());
        assert!(report.render().contains("Everything is set up correctly!"));
    }

    #[test]
    fn report_is_ready_with_a_single_configured_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&calls, Ok("hello".to_string()));
        let env_file = std::env::temp_dir().join(format!(
            "careerkit-single-provider-{}.env",
            std::process::id()
        ));
        std::fs::write(&env_file, "OPENAI_API_KEY=sk-test\n").expect("env file should be writable");

        let report = SetupInspector::new(&registry)
            .with_env_file(env_file.clone())
            .with_credential_lookup(lookup(&[("OPENAI_API_KEY", "sk-test-1234567890abcd")]))
            .run(true);
        let _ = std::fs::remove_file(&env_file);

        assert!(report.is_ready(), "{}", report.render());
        assert_eq!(report.blocking_checks().count(), 0);
        assert_eq!(report.failed_checks().count(), 2);
        assert!(
            report
                .render()
                .contains("Note: Claude is not configured and cannot be selected.")
        );
    }

    #[test]
    fn failed_connectivity_blocks_readiness() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&calls, Err(LlmError::Auth));
        let env_file = std::env::temp_dir().join(format!(
            "careerkit-failed-connectivity-{}.env",
            std::process::id()
        ));
        std::fs::write(&env_file, "OPENAI_API_KEY=sk-test\n").expect("env file should be writable");

        let report = SetupInspector::new(&registry)
            .with_env_file(env_file.clone())
            .with_credential_lookup(lookup(&[("OPENAI_API_KEY", "sk-test-1234567890abcd")]))
            .run(true);
        let _ = std::fs::remove_file(&env_file);

        assert!(!report.is_ready());
        let blocking = report.blocking_checks().collect::<Vec<_>>();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].section, CheckSection::Connectivity);
    }

    #[test]
    fn blank_scoped_key_does_not_hide_conventional_key() {
        let registry = ProviderRegistry::new();

        let report = SetupInspector::new(&registry)
            .with_credential_lookup(lookup(&[
                ("CAREERKIT_OPENAI_API_KEY", ""),
                ("OPENAI_API_KEY", "sk-test-1234567890abcd"),
            ]))
            .run(false);

        assert!(report.render().contains("OpenAI API key loaded: sk-test-12...abcd"));
    }

    struct AnthropicProbe;

    impl CompletionClient for AnthropicProbe {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Anthropic
        }

        fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            Ok("hi".to_string())
        }
    }
}
