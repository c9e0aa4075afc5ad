//! Static GPU instance shape catalogs.
//!
//! Provider pricing APIs return SKUs for their entire instance fleet, most
//! of which carry no GPU. Each adapter filters the response against the
//! GPU-bearing subset declared here so pricing SKUs can be attached to the
//! right `InstanceType` shape without re-deriving it from free-text SKU
//! descriptions every poll.

use cloudarb_types::{GpuKind, InstanceType};

/// One catalog entry: a provider-specific instance name plus its GPU shape.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Provider-specific instance type name.
    pub name: &'static str,
    /// Canonical GPU kind string before canonicalization.
    pub gpu_kind: &'static str,
    /// GPUs per instance.
    pub gpu_count: u32,
    /// Virtual CPUs, when documented by the provider.
    pub vcpus: Option<u32>,
    /// Memory in GiB, when documented by the provider.
    pub memory_gib: Option<u32>,
}

impl CatalogEntry {
    /// Build the shape-only `InstanceType` for this entry (callers attach
    /// pricing separately).
    #[must_use]
    pub fn instance_type(&self) -> InstanceType {
        InstanceType {
            name: self.name.to_string(),
            gpu_kind: GpuKind::new(self.gpu_kind),
            gpu_count: self.gpu_count,
            vcpus: self.vcpus,
            memory_gib: self.memory_gib,
        }
    }
}

/// AWS EC2 GPU-accelerated instance families.
pub const AWS: &[CatalogEntry] = &[
    CatalogEntry { name: "p4d.24xlarge", gpu_kind: "A100", gpu_count: 8, vcpus: Some(96), memory_gib: Some(1152) },
    CatalogEntry { name: "p4de.24xlarge", gpu_kind: "A100", gpu_count: 8, vcpus: Some(96), memory_gib: Some(1152) },
    CatalogEntry { name: "p5.48xlarge", gpu_kind: "H100", gpu_count: 8, vcpus: Some(192), memory_gib: Some(2048) },
    CatalogEntry { name: "g5.xlarge", gpu_kind: "A10G", gpu_count: 1, vcpus: Some(4), memory_gib: Some(16) },
    CatalogEntry { name: "g5.48xlarge", gpu_kind: "A10G", gpu_count: 8, vcpus: Some(192), memory_gib: Some(768) },
];

/// GCP Compute Engine GPU-accelerated machine types.
pub const GCP: &[CatalogEntry] = &[
    CatalogEntry { name: "a2-highgpu-1g", gpu_kind: "A100", gpu_count: 1, vcpus: Some(12), memory_gib: Some(85) },
    CatalogEntry { name: "a2-ultragpu-8g", gpu_kind: "A100", gpu_count: 8, vcpus: Some(96), memory_gib: Some(1360) },
    CatalogEntry { name: "a3-highgpu-8g", gpu_kind: "H100", gpu_count: 8, vcpus: Some(208), memory_gib: Some(1872) },
    CatalogEntry { name: "g2-standard-4", gpu_kind: "L4", gpu_count: 1, vcpus: Some(4), memory_gib: Some(16) },
];

/// Azure GPU-accelerated VM sizes.
pub const AZURE: &[CatalogEntry] = &[
    CatalogEntry { name: "Standard_ND96asr_v4", gpu_kind: "A100", gpu_count: 8, vcpus: Some(96), memory_gib: Some(900) },
    CatalogEntry { name: "Standard_ND96isr_H100_v5", gpu_kind: "H100", gpu_count: 8, vcpus: Some(96), memory_gib: Some(1900) },
    CatalogEntry { name: "Standard_NC24ads_A100_v4", gpu_kind: "A100", gpu_count: 1, vcpus: Some(24), memory_gib: Some(220) },
    CatalogEntry { name: "Standard_NV36ads_A10_v5", gpu_kind: "A10", gpu_count: 1, vcpus: Some(36), memory_gib: Some(440) },
];

/// Lambda Labs on-demand instance types.
pub const LAMBDA_LABS: &[CatalogEntry] = &[
    CatalogEntry { name: "gpu_1x_a100", gpu_kind: "A100", gpu_count: 1, vcpus: Some(30), memory_gib: Some(200) },
    CatalogEntry { name: "gpu_8x_a100", gpu_kind: "A100", gpu_count: 8, vcpus: Some(124), memory_gib: Some(1800) },
    CatalogEntry { name: "gpu_8x_h100_sxm5", gpu_kind: "H100", gpu_count: 8, vcpus: Some(208), memory_gib: Some(1800) },
    CatalogEntry { name: "gpu_1x_a10", gpu_kind: "A10", gpu_count: 1, vcpus: Some(30), memory_gib: Some(200) },
];

/// RunPod community/secure cloud GPU pod types.
pub const RUNPOD: &[CatalogEntry] = &[
    CatalogEntry { name: "NVIDIA A100 80GB PCIe", gpu_kind: "A100", gpu_count: 1, vcpus: None, memory_gib: None },
    CatalogEntry { name: "NVIDIA H100 80GB HBM3", gpu_kind: "H100", gpu_count: 1, vcpus: None, memory_gib: None },
    CatalogEntry { name: "NVIDIA RTX A6000", gpu_kind: "A6000", gpu_count: 1, vcpus: None, memory_gib: None },
];

/// Look up a catalog entry by instance name.
#[must_use]
pub fn find<'a>(catalog: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    catalog.iter().find(|e| e.name == name)
}
