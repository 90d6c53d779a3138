//! Provider identifiers and the fallback priority list.

use super::error::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// LLM provider reachable through the gateway or directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Groq,
    Gemini,
    OpenRouter,
    LmStudio,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Groq,
        ProviderId::Gemini,
        ProviderId::OpenRouter,
        ProviderId::LmStudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Groq => "groq",
            ProviderId::Gemini => "gemini",
            ProviderId::OpenRouter => "openrouter",
            ProviderId::LmStudio => "lmstudio",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(ProviderId::Groq),
            "gemini" => Ok(ProviderId::Gemini),
            "openrouter" => Ok(ProviderId::OpenRouter),
            "lmstudio" => Ok(ProviderId::LmStudio),
            _ => Err(LlmError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Ordered fallback sequence of providers.
///
/// Invariants: non-empty, no duplicates. The head is the default provider when
/// a request names none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProviderPriorityList(Vec<ProviderId>);

impl ProviderPriorityList {
    pub fn new(providers: Vec<ProviderId>) -> Result<Self, LlmError> {
        if providers.is_empty() {
            return Err(LlmError::InvalidRequest(
                "provider priority list cannot be empty".to_string(),
            ));
        }
        for (i, p) in providers.iter().enumerate() {
            if providers[..i].contains(p) {
                return Err(LlmError::InvalidRequest(format!(
                    "provider '{}' appears more than once in the priority list",
                    p
                )));
            }
        }
        Ok(Self(providers))
    }

    /// Default provider.
    pub fn head(&self) -> ProviderId {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[ProviderId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, provider: ProviderId) -> bool {
        self.0.contains(&provider)
    }

    /// Provider immediately after `provider`, if any.
    pub fn successor(&self, provider: ProviderId) -> Option<ProviderId> {
        let idx = self.0.iter().position(|p| *p == provider)?;
        self.0.get(idx + 1).copied()
    }

    /// Providers to try for a request whose effective provider is `start`:
    /// `start` followed by every provider after it in the list. A provider not
    /// in the list yields a chain of one.
    pub fn chain_from(&self, start: ProviderId) -> Vec<ProviderId> {
        match self.0.iter().position(|p| *p == start) {
            Some(idx) => self.0[idx..].to_vec(),
            None => vec![start],
        }
    }

    /// `preferred` first, then the rest of the list in order.
    pub fn preferred_first(&self, preferred: ProviderId) -> Vec<ProviderId> {
        std::iter::once(preferred)
            .chain(self.0.iter().copied().filter(|p| *p != preferred))
            .collect()
    }
}

impl<'de> Deserialize<'de> for ProviderPriorityList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let providers = Vec::<ProviderId>::deserialize(deserializer)?;
        ProviderPriorityList::new(providers).map_err(serde::de::Error::custom)
    }
}

impl Default for ProviderPriorityList {
    fn default() -> Self {
        Self(vec![ProviderId::Groq, ProviderId::Gemini])
    }
}
