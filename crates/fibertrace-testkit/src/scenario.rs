//! JSON replay scenarios: a list of commits plus hit-test probes.

use fibertrace_protocols::{FibertraceError, RendererInfo};
use serde::{Deserialize, Serialize};

use crate::spec::FiberSpec;

/// A recorded sequence of commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub renderer: Option<RendererInfo>,
    pub commits: Vec<ScenarioCommit>,
    #[serde(default)]
    pub probes: Vec<Probe>,
}

/// One commit: the tree rendered into a root, or `null` to unmount it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCommit {
    /// Scenario-local root number.
    #[serde(default)]
    pub root: u32,
    pub tree: Option<FiberSpec>,
}

/// A point to hit-test after the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub x: f64,
    pub y: f64,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, FibertraceError> {
        Ok(serde_json::from_str(json)?)
    }
}
