//! Scenario files – the arm, the avoidance parameters, the joint
//! configuration and the obstacles, read from TOML.
//!
//! ```toml
//! q = [0.3, -0.5, 0.8]
//!
//! [avoidance]
//! threshold = 0.2
//!
//! [arm]
//! end_effector = [0.25, 0.0, 0.0]
//! [[arm.joints]]
//! mass = 2.0
//! center_of_mass = [0.2, 0.0, 0.0]
//!
//! [[obstacles]]
//! center = [0.25, 0.2, 0.0]
//! radius = 0.05
//! ```

use std::fs;
use std::path::Path;

use avoidance_kinematics::ArmSpec;
use avoidance_signal::AvoidanceConfig;
use avoidance_types::Obstacle;
use serde::{Deserialize, Serialize};

/// Everything needed for one evaluation of the avoidance signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Joint angles (radians).  Empty means all zeros.
    #[serde(default)]
    pub q: Vec<f64>,

    #[serde(default)]
    pub avoidance: AvoidanceConfig,

    #[serde(default = "default_arm")]
    pub arm: ArmSpec,

    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

/// Three-link planar arm used when a scenario has no `[arm]` section.
fn default_arm() -> ArmSpec {
    ArmSpec::planar_links(&[(0.4, 2.0), (0.3, 1.5), (0.25, 1.0)])
}

impl Default for Scenario {
    /// A three-link planar arm bent around an obstacle near its first link.
    fn default() -> Self {
        Self {
            q: vec![0.3, -0.5, 0.8],
            avoidance: AvoidanceConfig::default(),
            arm: default_arm(),
            obstacles: vec![Obstacle::new(0.25, 0.2, 0.0, 0.05)],
        }
    }
}

impl Scenario {
    /// Joint configuration for an arm with `num_joints` joints.
    pub fn joint_configuration(&self, num_joints: usize) -> Result<Vec<f64>, String> {
        if self.q.is_empty() {
            return Ok(vec![0.0; num_joints]);
        }
        if self.q.len() != num_joints {
            return Err(format!(
                "Scenario has {} joint angles but the arm has {} joints",
                self.q.len(),
                num_joints
            ));
        }
        Ok(self.q.clone())
    }

    /// Check every obstacle, naming the first bad one by index.
    pub fn validate(&self) -> Result<(), String> {
        for (i, obstacle) in self.obstacles.iter().enumerate() {
            obstacle
                .validate()
                .map_err(|e| format!("obstacle {i}: {e}"))?;
        }
        Ok(())
    }
}

/// Load a scenario from `path`, apply environment overrides and check its
/// obstacles.
pub fn load_from(path: &Path) -> Result<Scenario, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read scenario at {}: {}", path.display(), e))?;
    let mut scenario: Scenario =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse scenario: {}", e))?;
    apply_env_overrides(&mut scenario);
    scenario.validate()?;
    Ok(scenario)
}

/// Apply `AVOID_*` environment variable overrides to `scenario`.
///
/// | Variable | Field |
/// |---|---|
/// | `AVOID_THRESHOLD` | `avoidance.threshold` |
/// | `AVOID_GAIN` | `avoidance.gain` |
///
/// Values that do not parse as numbers are ignored.
pub fn apply_env_overrides(scenario: &mut Scenario) {
    if let Ok(v) = std::env::var("AVOID_THRESHOLD")
        && let Ok(threshold) = v.parse::<f64>()
    {
        scenario.avoidance.threshold = threshold;
    }
    if let Ok(v) = std::env::var("AVOID_GAIN")
        && let Ok(gain) = v.parse::<f64>()
    {
        scenario.avoidance.gain = gain;
    }
}

/// Write `scenario` to `path`, creating parent directories as needed.
pub fn save_to(scenario: &Scenario, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    let raw = toml::to_string_pretty(scenario)
        .map_err(|e| format!("Failed to serialize scenario: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write scenario at {}: {}", path.display(), e))
}
