use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GenerationFailure, LlmError};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Anthropic];

    pub fn id(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Claude",
        }
    }

    /// Conventional credential variable, named in user-facing messages.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Prefixed credential variable, checked before [`Self::api_key_env`].
    pub fn scoped_api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "CAREERKIT_OPENAI_API_KEY",
            Self::Anthropic => "CAREERKIT_ANTHROPIC_API_KEY",
        }
    }

    pub fn model_env(self) -> &'static str {
        match self {
            Self::OpenAi => "CAREERKIT_OPENAI_MODEL",
            Self::Anthropic => "CAREERKIT_ANTHROPIC_MODEL",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestField {
    Position,
    JobDescription,
    ResumeContent,
    CompanyName,
    PolishInstructions,
}

impl RequestField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::JobDescription => "jobDescription",
            Self::ResumeContent => "resumeContent",
            Self::CompanyName => "companyName",
            Self::PolishInstructions => "polishInstructions",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::JobDescription => "Job Description",
            Self::ResumeContent => "Resume Content",
            Self::CompanyName => "Company Name",
            Self::PolishInstructions => "Polish Instructions",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "position" => Some(Self::Position),
            "jobDescription" => Some(Self::JobDescription),
            "resumeContent" => Some(Self::ResumeContent),
            "companyName" => Some(Self::CompanyName),
            "polishInstructions" => Some(Self::PolishInstructions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    Advice,
    CoverLetter,
    Polish,
}

impl GenerationTask {
    pub fn name(self) -> &'static str {
        match self {
            Self::Advice => "advice",
            Self::CoverLetter => "cover_letter",
            Self::Polish => "polish",
        }
    }

    pub fn required_fields(self) -> &'static [RequestField] {
        match self {
            Self::Advice => &[
                RequestField::Position,
                RequestField::JobDescription,
                RequestField::ResumeContent,
            ],
            Self::CoverLetter => &[
                RequestField::CompanyName,
                RequestField::Position,
                RequestField::JobDescription,
                RequestField::ResumeContent,
            ],
            Self::Polish => &[RequestField::Position, RequestField::ResumeContent],
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Self::Advice => 1024,
            Self::CoverLetter | Self::Polish => 800,
        }
    }

    pub fn temperature(self) -> f32 {
        DEFAULT_TEMPERATURE
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied form values keyed by field. Absent and blank fields are
/// treated the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationRequest {
    fields: BTreeMap<RequestField, String>,
}

impl GenerationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: RequestField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: RequestField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    /// Builds a request from `(key, value)` pairs using the wire keys
    /// (`position`, `jobDescription`, ...).
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, LlmError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let field = RequestField::from_key(key)
                .ok_or_else(|| LlmError::validation(format!("unknown request field '{key}'")))?;
            request.set(field, value);
        }
        Ok(request)
    }

    /// Trimmed value of `field`, or an empty string when absent.
    pub fn get(&self, field: RequestField) -> &str {
        self.fields.get(&field).map(|value| value.trim()).unwrap_or("")
    }

    pub fn missing_fields(&self, task: GenerationTask) -> Vec<RequestField> {
        task.required_fields()
            .iter()
            .copied()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::validation("model must not be empty"));
        }
        if self.prompt.trim().is_empty() {
            return Err(LlmError::validation("prompt must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(LlmError::validation("max_tokens must be greater than 0"));
        }
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(LlmError::validation(format!(
                "temperature must be in 0.0..=2.0 (got {temperature})"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success(GeneratedText),
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(generated) => Some(&generated.text),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Output shown verbatim by a presentation layer.
    pub fn render(&self) -> String {
        match self {
            Self::Success(generated) => generated.text.clone(),
            Self::Failure(failure) => failure.message(),
        }
    }

    pub fn into_result(self) -> Result<GeneratedText, GenerationFailure> {
        match self {
            Self::Success(generated) => Ok(generated),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<GenerationFailure> for GenerationResult {
    fn from(failure: GenerationFailure) -> Self {
        Self::Failure(failure)
    }
}
