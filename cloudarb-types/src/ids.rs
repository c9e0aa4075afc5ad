//! Identifiers and canonicalization used throughout the pricing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of clouds CloudArb arbitrages across.
///
/// Unlike a connector registry meant for open-ended extension, CloudArb
/// targets exactly five providers; a closed enum gives exhaustive matching
/// at every call site instead of string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderId {
    /// Amazon Web Services.
    Aws,
    /// Google Cloud Platform.
    Gcp,
    /// Microsoft Azure.
    Azure,
    /// Lambda Labs.
    LambdaLabs,
    /// `RunPod`.
    RunPod,
}

impl ProviderId {
    /// All providers, in ASCII order of their stable name — used as the
    /// tie-break ordering in the optimizer and for deterministic iteration.
    pub const ALL: [Self; 5] = [
        Self::Aws,
        Self::Azure,
        Self::Gcp,
        Self::LambdaLabs,
        Self::RunPod,
    ];

    /// Stable, lowercase identifier used in logs, cache keys, and fingerprints.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
            Self::LambdaLabs => "lambda-labs",
            Self::RunPod => "runpod",
        }
    }

    /// Whether this provider offers spot pricing at all.
    ///
    /// Lambda Labs and `RunPod` do not; the normalization rules in the
    /// pricing aggregator rely on this to decide whether a missing spot
    /// field is an omission or a data problem.
    #[must_use]
    pub const fn supports_spot(self) -> bool {
        !matches!(self, Self::LambdaLabs | Self::RunPod)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonicalized GPU kind, e.g. `A100`, `H100`, `L40S`.
///
/// Providers report GPU names inconsistently (`A100`, `a100`, `NVIDIA A100`);
/// construction always canonicalizes so equality and hashing behave as the
/// spec's "GPU kind strings map through a canonicalization table" rule
/// requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GpuKind(String);

impl GpuKind {
    /// Canonicalize a raw provider-reported GPU name into a stable key.
    ///
    /// Strips vendor prefixes (`NVIDIA`, `AMD`), collapses whitespace, and
    /// upper-cases the remainder. `"NVIDIA A100"`, `"a100"`, and `"A100"` all
    /// canonicalize to `"A100"`.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        const VENDOR_PREFIXES: [&str; 2] = ["NVIDIA", "AMD"];
        let upper = raw.trim().to_uppercase();
        let mut rest = upper.as_str();
        for prefix in VENDOR_PREFIXES {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped.trim_start();
                break;
            }
        }
        let collapsed = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(collapsed)
    }

    /// Borrow the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GpuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GpuKind {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for GpuKind {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

/// Opaque, provider-defined region string. Regions pass through verbatim;
/// CloudArb never attempts to parse provider region naming schemes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region(String);

impl Region {
    /// Wrap a raw provider region string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw region string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Equivalence class of regions considered interchangeable for arbitrage.
///
/// Conservative by default: only same-continent regions are interchangeable.
/// Implementers adding cross-continent equivalences should tighten risk
/// scoring accordingly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionClass(String);

impl RegionClass {
    /// Wrap a raw region-class label (e.g. `"north-america"`, `"europe"`).
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallback class for a region with no configured mapping: the region
    /// itself, so unmapped regions are never treated as equivalent to
    /// anything else (conservative default).
    #[must_use]
    pub fn unmapped(region: &Region) -> Self {
        Self(format!("unmapped:{}", region.as_str()))
    }
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The tuple `(provider, instance, region)` — the granularity at which
/// prices are quoted and allocations are selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Line {
    /// Cloud provider.
    pub provider: ProviderId,
    /// Provider-specific instance type name (e.g. `p4d.24xlarge`).
    pub instance: String,
    /// Provider-specific region string.
    pub region: Region,
}

impl Line {
    /// Construct a new line key.
    #[must_use]
    pub fn new(provider: ProviderId, instance: impl Into<String>, region: Region) -> Self {
        Self {
            provider,
            instance: instance.into(),
            region,
        }
    }

    /// Canonical fingerprint string used as a cache/cooldown key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!("{}/{}/{}", self.provider, self.instance, self.region)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}
