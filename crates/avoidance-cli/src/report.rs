//! Rendering of an avoidance evaluation for the terminal or as JSON.

use avoidance_signal::PairContribution;
use colored::Colorize;
use nalgebra::DVector;
use serde::Serialize;

/// One in-range (obstacle, segment) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub obstacle: usize,
    pub segment: usize,
    pub closest: [f64; 3],
    pub rho: f64,
    pub force: [f64; 3],
    pub joint_force: Vec<f64>,
}

/// Result of evaluating a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub q: Vec<f64>,
    pub joint_force: Vec<f64>,
    pub pairs: Vec<PairReport>,
}

impl Report {
    pub fn new(q: &[f64], total: &DVector<f64>, pairs: &[PairContribution]) -> Self {
        Self {
            q: q.to_vec(),
            joint_force: total.iter().copied().collect(),
            pairs: pairs
                .iter()
                .map(|p| PairReport {
                    obstacle: p.obstacle,
                    segment: p.segment,
                    closest: [p.closest.x, p.closest.y, p.closest.z],
                    rho: p.rho,
                    force: [p.force.x, p.force.y, p.force.z],
                    joint_force: p.joint_force.iter().copied().collect(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize report: {}", e))
    }

    /// Human-readable summary.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("  {}\n", "Joint-space avoidance force".bold()));
        for (i, (q, u)) in self.q.iter().zip(&self.joint_force).enumerate() {
            out.push_str(&format!("    joint{i:<3} q = {q:>9.4}   u = {u:>12.6}\n"));
        }

        if self.pairs.is_empty() {
            out.push_str(&format!("\n  {}\n", "No obstacle within range.".dimmed()));
            return out;
        }

        out.push_str(&format!("\n  {}\n", "In-range pairs".bold()));
        for p in &self.pairs {
            let force = (p.force[0].powi(2) + p.force[1].powi(2) + p.force[2].powi(2)).sqrt();
            out.push_str(&format!(
                "    obstacle {} / segment {}   rho = {:.4}   |F| = {:.4}\n",
                p.obstacle, p.segment, p.rho, force
            ));
        }
        out
    }
}
