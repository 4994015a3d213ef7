use serde::{Deserialize, Serialize};
use std::fmt;

/// Family a selection strategy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Dynamic ensemble selection (KNORA-U, KNORA-E).
    #[serde(rename = "DES")]
    Des,
    /// Dynamic classifier selection (OLA, LCA, MCB).
    #[serde(rename = "DCS")]
    Dcs,
    /// The whole pool votes; no per-instance selection.
    Static,
    /// Two-stage or tie-breaking combinations.
    Hybrid,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Des => "DES",
            StrategyKind::Dcs => "DCS",
            StrategyKind::Static => "Static",
            StrategyKind::Hybrid => "Hybrid",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
