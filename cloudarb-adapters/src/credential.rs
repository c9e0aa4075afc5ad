//! Credential resolution for provider adapters.

use cloudarb_types::CloudArbError;

/// How an adapter authenticates to its provider's pricing API.
#[derive(Debug, Clone)]
pub enum CredentialHandle {
    /// No credential required (Azure's retail prices API is public).
    None,
    /// A bearer token or API key read from an environment variable at
    /// construction time.
    ApiKey(String),
}

impl CredentialHandle {
    /// Read `env_var` if set, otherwise `None`.
    #[must_use]
    pub fn from_env(env_var: Option<&str>) -> Self {
        match env_var.and_then(|name| std::env::var(name).ok()) {
            Some(key) if !key.is_empty() => Self::ApiKey(key),
            _ => Self::None,
        }
    }

    /// The API key, or an `AuthFailed` error if one is required but absent.
    pub fn require_key(&self, provider: cloudarb_types::ProviderId) -> Result<&str, CloudArbError> {
        match self {
            Self::ApiKey(key) => Ok(key.as_str()),
            Self::None => Err(CloudArbError::auth_failed(provider.to_string())),
        }
    }
}
