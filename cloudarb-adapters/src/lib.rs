//! cloudarb-adapters
//!
//! `ProviderAdapter` implementations for the five clouds CloudArb
//! arbitrages across.
#![warn(missing_docs)]

/// GPU instance shape catalogs, one per provider.
pub mod catalog;
/// Credential resolution for provider adapters.
pub mod credential;

/// Amazon Web Services.
pub mod aws;
/// Microsoft Azure.
pub mod azure;
/// Google Cloud Platform.
pub mod gcp;
/// Lambda Labs.
pub mod lambda_labs;
/// `RunPod`.
pub mod runpod;

pub use aws::AwsAdapter;
pub use azure::AzureAdapter;
pub use credential::CredentialHandle;
pub use gcp::GcpAdapter;
pub use lambda_labs::LambdaLabsAdapter;
pub use runpod::RunPodAdapter;
