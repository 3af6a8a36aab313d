use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use skin_audit::{
    analyze, scene::MemoryScene, AnalysisOptions, ZeroWeightJoint, DEFAULT_THRESHOLD,
};

#[derive(Parser, Debug)]
#[command(
    name = "skin-audit",
    version,
    about = "Find joints that can be pruned from a skinned mesh before export"
)]
struct Cli {
    /// Scene description (JSON)
    scene: PathBuf,
    /// Mesh transform to analyse. Defaults to the first selected node in the scene.
    #[arg(long)]
    mesh: Option<String>,
    /// Normalized weights at or below this value count as zero
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    threshold: f32,
    /// Print the results as JSON
    #[arg(long)]
    json: bool,
    /// Log each analysis stage
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let source = std::fs::read_to_string(&cli.scene)
        .with_context(|| format!("failed to read {}", cli.scene.display()))?;
    let scene = MemoryScene::from_json(&source)
        .with_context(|| format!("failed to load scene {}", cli.scene.display()))?;

    let mesh = resolve_mesh(cli.mesh, &scene)?;
    info!("analysing {mesh}");

    let options = AnalysisOptions {
        threshold: cli.threshold,
    };
    let results = analyze(&scene, &mesh, &options)
        .with_context(|| format!("could not analyse {mesh}"))?;

    if cli.json {
        let report = json_report(&mesh, options.threshold, &results);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let (zero_weight, unbound) = split_by_binding(&results);
        print_report(&mesh, &zero_weight, &unbound);
    }

    Ok(())
}

/// The explicit `--mesh`, or else the first selected node.
fn resolve_mesh(mesh: Option<String>, scene: &MemoryScene) -> Result<String> {
    match mesh {
        Some(mesh) => Ok(mesh),
        None => match scene.selection().first() {
            Some(selected) => Ok(selected.clone()),
            None => bail!("no mesh selected, pass --mesh or add one to the scene's selection"),
        },
    }
}

/// Zero-weight influences first, unbound joints second.
fn split_by_binding(
    results: &[ZeroWeightJoint],
) -> (Vec<&ZeroWeightJoint>, Vec<&ZeroWeightJoint>) {
    results.iter().partition(|joint| joint.is_zero_weight())
}

fn json_report(mesh: &str, threshold: f32, results: &[ZeroWeightJoint]) -> serde_json::Value {
    let (zero_weight, unbound) = split_by_binding(results);
    serde_json::json!({
        "mesh": mesh,
        "threshold": threshold,
        "zero_weight": zero_weight,
        "unbound": unbound,
    })
}

fn print_report(mesh: &str, zero_weight: &[&ZeroWeightJoint], unbound: &[&ZeroWeightJoint]) {
    println!("\n===== joint analysis for {mesh} =====");

    println!("\n1. Zero-weight joints ({}):", zero_weight.len());
    if zero_weight.is_empty() {
        println!("- no zero-weight joints found");
    }
    for joint in zero_weight {
        println!("- {}", describe(joint));
    }

    println!("\n2. Joints without a skin cluster ({}):", unbound.len());
    if unbound.is_empty() {
        println!("- every joint is bound to the skin cluster");
    }
    for joint in unbound {
        println!("- {}", describe(joint));
    }
}

fn describe(joint: &ZeroWeightJoint) -> String {
    match &joint.parent {
        Some(parent) => format!("{} (parent: {parent})", joint.name),
        None => joint.name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM: &str = include_str!("../../demos/arm.json");

    #[test]
    fn test_explicit_mesh_wins_over_selection() {
        let scene = MemoryScene::from_json(ARM).unwrap();

        let mesh = resolve_mesh(Some("armShape".to_owned()), &scene).unwrap();
        assert_eq!(mesh, "armShape");
    }

    #[test]
    fn test_falls_back_to_selection() {
        let scene = MemoryScene::from_json(ARM).unwrap();

        assert_eq!(resolve_mesh(None, &scene).unwrap(), "|arm");
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let scene = MemoryScene::new();

        let err = resolve_mesh(None, &scene).unwrap_err();
        assert!(err.to_string().starts_with("no mesh selected"));
    }

    #[test]
    fn test_json_report_groups_arm_scene() {
        let scene = MemoryScene::from_json(ARM).unwrap();
        let mesh = resolve_mesh(None, &scene).unwrap();
        let results = analyze(&scene, &mesh, &AnalysisOptions::default()).unwrap();

        let report = json_report(&mesh, DEFAULT_THRESHOLD, &results);
        assert_eq!(report["mesh"], "|arm");
        assert_eq!(
            report["zero_weight"],
            serde_json::json!([
                { "name": "|root|shoulder|twist", "parent": "|root|shoulder", "has_skin_cluster": true }
            ])
        );
        assert_eq!(
            report["unbound"],
            serde_json::json!([
                { "name": "|root", "parent": null, "has_skin_cluster": false },
                {
                    "name": "|root|shoulder|elbow|wrist|wrist_end",
                    "parent": "|root|shoulder|elbow|wrist",
                    "has_skin_cluster": false
                }
            ])
        );
    }

    #[test]
    fn test_text_groups_match_json_groups() {
        let scene = MemoryScene::from_json(ARM).unwrap();
        let results = analyze(&scene, "arm", &AnalysisOptions::default()).unwrap();

        let (zero_weight, unbound) = split_by_binding(&results);
        assert_eq!(zero_weight.len(), 1);
        assert_eq!(unbound.len(), 2);
        assert_eq!(describe(zero_weight[0]), "|root|shoulder|twist (parent: |root|shoulder)");
        assert_eq!(describe(unbound[0]), "|root");
    }

    #[test]
    fn test_negative_threshold_reaches_the_analysis() {
        let cli = Cli::try_parse_from(["skin-audit", "scene.json", "--threshold", "-0.5"]).unwrap();
        assert_eq!(cli.threshold, -0.5);

        let scene = MemoryScene::from_json(ARM).unwrap();
        let options = AnalysisOptions {
            threshold: cli.threshold,
        };
        assert!(matches!(
            analyze(&scene, "arm", &options),
            Err(skin_audit::AnalysisError::InvalidThreshold(_))
        ));
    }
}
