use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the CloudArb workspace.
///
/// Variants map one-to-one onto the error kinds in the core error-handling
/// design: transient and schema failures never reach this type (adapters
/// absorb them internally), while auth failures, bad requests, solver
/// failures, and pricing-availability gaps are surfaced here with a stable
/// machine-readable code and a human message. Provider response bodies are
/// never embedded verbatim.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[non_exhaustive]
pub enum CloudArbError {
    /// Caller input failed validation before any solve was attempted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No successful pricing publish has occurred yet and the grace period elapsed.
    #[error("pricing unavailable: {0}")]
    PricingUnavailable(String),

    /// The MILP/LP solver library raised internally; safe to retry.
    #[error("solver failure: {0}")]
    SolverFailure(String),

    /// A named optimization run id is unknown to the run registry.
    #[error("unknown optimization run: {0}")]
    UnknownRun(String),

    /// An adapter's credentials were rejected (401/403); the adapter is quarantined.
    #[error("authentication failed for provider {provider}")]
    AuthFailed {
        /// Provider whose credentials were rejected.
        provider: String,
    },

    /// The configuration contained an unrecognized key or an out-of-range value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown/opaque error, retained for forward compatibility.
    #[error("unknown error: {0}")]
    Other(String),
}

impl CloudArbError {
    /// Build an `InvalidRequest` error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Build a `PricingUnavailable` error.
    pub fn pricing_unavailable(msg: impl Into<String>) -> Self {
        Self::PricingUnavailable(msg.into())
    }

    /// Build a `SolverFailure` error.
    pub fn solver_failure(msg: impl Into<String>) -> Self {
        Self::SolverFailure(msg.into())
    }

    /// Build an `AuthFailed` error for a provider.
    pub fn auth_failed(provider: impl Into<String>) -> Self {
        Self::AuthFailed {
            provider: provider.into(),
        }
    }

    /// Stable, kebab-case machine-readable code for logs and downstream callers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid-request",
            Self::PricingUnavailable(_) => "pricing-unavailable",
            Self::SolverFailure(_) => "solver-failure",
            Self::UnknownRun(_) => "unknown-run",
            Self::AuthFailed { .. } => "auth-failed",
            Self::InvalidConfig(_) => "invalid-config",
            Self::Other(_) => "unknown",
        }
    }

    /// Whether this error should be surfaced to API callers as actionable,
    /// as opposed to an internal condition that is retried or logged only.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}
