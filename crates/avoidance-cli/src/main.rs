//! `avoid` – evaluate the obstacle avoidance signal for a scenario.
//!
//! ```text
//! avoid                  run the built-in three-link scenario
//! avoid SCENARIO.toml    run a scenario file
//! avoid --init PATH      write the built-in scenario to PATH
//! ```
//!
//! Set `AVOID_OUTPUT=json` to print the report as JSON.

mod config;
mod report;
mod telemetry;

use std::path::Path;
use std::process::ExitCode;

use avoidance_kinematics::{RobotModel, SerialArm};
use avoidance_signal::ObstacleAvoidance;
use colored::Colorize;
use nalgebra::DVector;
use tracing::{debug, info};

use crate::config::Scenario;
use crate::report::Report;

fn main() -> ExitCode {
    let guard = telemetry::init_tracing("avoid");
    debug!(span_export = guard.is_exporting(), "tracing initialised");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let scenario = match args {
        [] => {
            let mut scenario = Scenario::default();
            config::apply_env_overrides(&mut scenario);
            scenario
        }
        [flag, path] if flag == "--init" => {
            config::save_to(&Scenario::default(), Path::new(path))?;
            println!("  {} Scenario written to {}", "✓".green().bold(), path.bold());
            return Ok(());
        }
        [flag] if flag == "--help" || flag == "-h" => {
            print_usage();
            return Ok(());
        }
        [path] => config::load_from(Path::new(path))?,
        _ => {
            print_usage();
            return Err("unexpected arguments".to_string());
        }
    };

    let json = std::env::var("AVOID_OUTPUT").as_deref() == Ok("json");
    let report = evaluate(&scenario)?;
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}

fn evaluate(scenario: &Scenario) -> Result<Report, String> {
    let arm = SerialArm::from_spec(&scenario.arm).map_err(|e| e.to_string())?;
    let avoidance =
        ObstacleAvoidance::new(&arm, scenario.avoidance).map_err(|e| e.to_string())?;
    let q = scenario.joint_configuration(arm.num_joints())?;
    debug!(?q, config = ?avoidance.config(), "evaluating scenario");

    let pairs = avoidance
        .contributions(&q, &scenario.obstacles)
        .map_err(|e| e.to_string())?;
    let mut total = DVector::zeros(arm.num_joints());
    for pair in &pairs {
        total += &pair.joint_force;
    }

    info!(
        joints = arm.num_joints(),
        obstacles = scenario.obstacles.len(),
        active_pairs = pairs.len(),
        magnitude = total.norm(),
        "avoidance signal computed"
    );
    Ok(Report::new(&q, &total, &pairs))
}

fn print_usage() {
    println!("{}", "Usage:".bold());
    println!("  avoid                  run the built-in scenario");
    println!("  avoid SCENARIO.toml    run a scenario file");
    println!("  avoid --init PATH      write the built-in scenario to PATH");
}

#[cfg(test)]
mod tests {
    use super::*;
    use avoidance_types::Obstacle;

    #[test]
    fn default_scenario_produces_a_push() {
        let report = evaluate(&Scenario::default()).unwrap();
        assert_eq!(report.joint_force.len(), 3);
        assert!(!report.pairs.is_empty());
        assert!(report.joint_force.iter().all(|u| u.is_finite()));
        assert!(report.joint_force.iter().any(|u| *u != 0.0));
    }

    #[test]
    fn scenario_without_obstacles_is_zero() {
        let scenario = Scenario {
            obstacles: Vec::new(),
            ..Scenario::default()
        };
        let report = evaluate(&scenario).unwrap();
        assert_eq!(report.joint_force, vec![0.0; 3]);
        assert!(report.pairs.is_empty());
    }

    #[test]
    fn mismatched_q_is_reported() {
        let scenario = Scenario {
            q: vec![0.0],
            ..Scenario::default()
        };
        assert!(evaluate(&scenario).unwrap_err().contains("joint angles"));
    }

    #[test]
    fn invalid_arm_is_reported() {
        let mut scenario = Scenario::default();
        scenario.arm.joints.clear();
        scenario.obstacles.push(Obstacle::point(0.0, 0.0, 0.0));
        assert!(evaluate(&scenario).unwrap_err().contains("Invalid robot model"));
    }

    #[test]
    fn reported_total_matches_generate() {
        let scenario = Scenario {
            obstacles: vec![
                Obstacle::new(0.25, 0.2, 0.0, 0.05),
                Obstacle::point(0.5, 0.35, 0.0),
            ],
            ..Scenario::default()
        };
        let report = evaluate(&scenario).unwrap();

        let arm = SerialArm::from_spec(&scenario.arm).unwrap();
        let avoidance = ObstacleAvoidance::new(&arm, scenario.avoidance).unwrap();
        let expected = avoidance.generate(&scenario.q, &scenario.obstacles).unwrap();
        for (got, want) in report.joint_force.iter().zip(expected.iter()) {
            assert!((got - want).abs() <= 1e-12 * (1.0 + want.abs()), "{got} vs {want}");
        }
    }

    #[test]
    fn init_then_run_scenario_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("scenario.toml");
        let path_str = path.to_string_lossy().to_string();

        run(&["--init".to_string(), path_str.clone()]).unwrap();
        assert!(path.exists());
        run(&[path_str]).unwrap();
    }

    #[test]
    fn unexpected_arguments_are_rejected() {
        let args = ["a", "b", "c"].map(String::from);
        assert!(run(&args).is_err());
    }
}
