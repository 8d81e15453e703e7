//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulated calendar year. One clock step = one year.
pub type Year = u32;

/// Experience points. Per-field XP only ever grows.
pub type Xp = u32;

/// The canonical run identifier.
pub type RunId = String;

/// Key into the economic metric table (`debt_gdp`, `gdp_growth`, ...).
pub type MetricKey = String;

/// The five technology fields a player can study and deploy.
///
/// Closed set. Saves written before the rename carry a `_deployed`
/// suffix on deployment keys, so each variant accepts that alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    #[serde(alias = "topological_q_computing_deployed")]
    TopologicalQComputing,
    #[serde(alias = "fracton_memory_deployed")]
    FractonMemory,
    #[serde(alias = "time_crystal_sync_deployed")]
    TimeCrystalSync,
    #[serde(alias = "fusion_mhd_control_deployed")]
    FusionMhdControl,
    #[serde(alias = "holographic_encoding_deployed")]
    HolographicEncoding,
}

impl FieldId {
    pub const ALL: [FieldId; 5] = [
        FieldId::TopologicalQComputing,
        FieldId::FractonMemory,
        FieldId::TimeCrystalSync,
        FieldId::FusionMhdControl,
        FieldId::HolographicEncoding,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TopologicalQComputing => "topological_q_computing",
            Self::FractonMemory         => "fracton_memory",
            Self::TimeCrystalSync       => "time_crystal_sync",
            Self::FusionMhdControl      => "fusion_mhd_control",
            Self::HolographicEncoding   => "holographic_encoding",
        }
    }

    /// Human-readable label, e.g. "fracton memory".
    pub fn label(&self) -> String {
        self.name().replace('_', " ")
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Political office held by the player, derived from total XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoliticalLevel {
    #[serde(alias = "Mayor")]
    Mayor,
    #[serde(alias = "Governor")]
    Governor,
    #[serde(alias = "President")]
    President,
}

impl PoliticalLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mayor     => "Mayor",
            Self::Governor  => "Governor",
            Self::President => "President",
        }
    }
}

impl fmt::Display for PoliticalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
