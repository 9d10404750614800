//! Field names and abbreviations for compute-node status records.
//!
//! Node records carry recent and longer-term utilization for CPU, virtual and
//! resident memory, GPU and GPU memory, percentages in 0..100, plus status and
//! count fields. The table below makes every one of them reachable under its
//! historical name, a dashed name and a short `%` form; capitalized forms name
//! the longer-term field.

use crate::query::Vocabulary;
use crate::Result;

/// Fields present in the records under their own names.
const CANONICAL_FIELDS: &[&str] = &[
    "cpu_recent",
    "cpu_longer",
    "mem_recent",
    "mem_longer",
    "resident_recent",
    "resident_longer",
    "gpu_recent",
    "gpu_longer",
    "gpumem_recent",
    "gpumem_longer",
    "cpu_status",
    "gpu_status",
    "users_recent",
    "users_longer",
    "jobs_recent",
    "jobs_longer",
    "violators",
    "zombies",
];

/// `(alias, target)`; a target may itself be an alias.
const ALIASES: &[(&str, &str)] = &[
    ("virt_recent", "mem_recent"),
    ("virt_longer", "mem_longer"),
    ("res_recent", "resident_recent"),
    ("res_longer", "resident_longer"),
    ("cpu-recent", "cpu_recent"),
    ("cpu-longer", "cpu_longer"),
    ("virt-recent", "virt_recent"),
    ("virt-longer", "virt_longer"),
    ("res-recent", "res_recent"),
    ("res-longer", "res_longer"),
    ("gpu-recent", "gpu_recent"),
    ("gpu-longer", "gpu_longer"),
    ("gpumem-recent", "gpumem_recent"),
    ("gpumem-longer", "gpumem_longer"),
    ("cpu-status", "cpu_status"),
    ("gpu-status", "gpu_status"),
    ("users-recent", "users_recent"),
    ("users-longer", "users_longer"),
    ("jobs-recent", "jobs_recent"),
    ("jobs-longer", "jobs_longer"),
    ("cpu%", "cpu-recent"),
    ("Cpu%", "cpu-longer"),
    ("virt%", "virt-recent"),
    ("Virt%", "virt-longer"),
    ("res%", "res-recent"),
    ("Res%", "res-longer"),
    ("gpu%", "gpu-recent"),
    ("Gpu%", "gpu-longer"),
    ("gpumem%", "gpumem-recent"),
    ("Gpumem%", "gpumem-longer"),
    ("cpufail", "cpu-status"),
    ("gpufail", "gpu-status"),
    ("users", "users-recent"),
    ("Users", "users-longer"),
    ("jobs", "jobs-recent"),
    ("Jobs", "jobs-longer"),
];

/// `(name, query)`, in dependency order.
const OPERATIONS: &[(&str, &str)] = &[
    ("gpu", "gpu*"),
    ("compute", "c*"),
    ("hugemem", "hugemem*"),
    ("login", "login*"),
    ("cpu-busy", "cpu% >= 50"),
    ("Cpu-busy", "Cpu% >= 50"),
    ("cpu-idle", "cpu% < 50"),
    ("Cpu-idle", "Cpu% < 50"),
    ("virt-busy", "virt% >= 50"),
    ("Virt-busy", "Virt% >= 50"),
    ("virt-idle", "virt% < 50"),
    ("Virt-idle", "Virt% < 50"),
    ("res-busy", "res% >= 50"),
    ("Res-busy", "Res% >= 50"),
    ("res-idle", "res% < 50"),
    ("Res-idle", "Res% < 50"),
    ("gpu-busy", "gpu% >= 50"),
    ("Gpu-busy", "Gpu% >= 50"),
    ("gpu-idle", "gpu and gpu% < 50"),
    ("Gpu-idle", "gpu and Gpu% < 50"),
    ("gpumem-busy", "gpumem% >= 50"),
    ("Gpumem-busy", "Gpumem% >= 50"),
    ("gpumem-idle", "gpu and gpumem% < 50"),
    ("Gpumem-idle", "gpu and Gpumem% < 50"),
    ("cpu-down", "cpufail > 0"),
    ("gpu-down", "gpu and gpufail > 0"),
    (
        "busy",
        "cpu-busy or gpu-busy or res-busy or virt-busy or gpumem-busy",
    ),
    (
        "Busy",
        "Cpu-busy or Gpu-busy or Res-busy or Virt-busy or Gpumem-busy",
    ),
    (
        "idle",
        "cpu-idle and virt-idle and res-idle and (~gpu* or (gpu% < 50 and gpumem% < 50))",
    ),
    (
        "Idle",
        "Cpu-idle and Virt-idle and Res-idle and (~gpu* or (Gpu% < 50 and Gpumem% < 50))",
    ),
    ("down", "cpu-down or gpu-down"),
];

/// Vocabulary for querying compute-node status records.
pub fn node_vocabulary() -> Result<Vocabulary> {
    let mut v = Vocabulary::new();
    for name in CANONICAL_FIELDS {
        v.add_field(*name);
    }
    for (name, target) in ALIASES {
        v.add_alias(*name, *target);
    }
    for (name, query) in OPERATIONS {
        v.define_operation(*name, query)?;
    }
    tracing::debug!(
        fields = CANONICAL_FIELDS.len() + ALIASES.len(),
        operations = OPERATIONS.len(),
        "built node vocabulary"
    );
    Ok(v)
}
