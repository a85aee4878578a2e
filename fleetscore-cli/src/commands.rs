//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use crate::RunArgs;
use fleetscore_ml::config::workspace_config_path;
use fleetscore_ml::{PipelineConfig, PipelineKind, ScoringConfig};
use std::path::Path;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Drivers(args) => handle_run(PipelineKind::Drivers, &args, workspace, config_file),
        Commands::Fleet(args) => handle_run(PipelineKind::Fleet, &args, workspace, config_file),
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<ScoringConfig> {
    fleetscore_ml::load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

/// Apply command-line flags on top of a loaded pipeline configuration.
fn apply_overrides(config: &mut PipelineConfig, args: &RunArgs) {
    if let Some(input) = &args.input {
        config.input_path = input.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ratio) = args.test_ratio {
        config.split_ratio = ratio;
    }
    if let Some(trees) = args.trees {
        config.forest.n_estimators = trees;
    }
    if args.show_actual {
        config.report.show_actual = true;
    }
}

fn handle_run(
    kind: PipelineKind,
    args: &RunArgs,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let scoring = load(workspace, config_file)?;
    let mut config = match kind {
        PipelineKind::Drivers => scoring.drivers,
        PipelineKind::Fleet => scoring.fleet,
    };
    apply_overrides(&mut config, args);
    tracing::debug!(
        pipeline = %kind,
        input = %config.input_path.display(),
        seed = config.seed,
        split_ratio = config.split_ratio,
        trees = config.forest.n_estimators,
        "Effective pipeline configuration"
    );

    let report = fleetscore_ml::run(kind, &config)
        .map_err(|e| anyhow::anyhow!("{} pipeline failed: {}", kind, e))?;
    print!("{report}");

    if let Some(path) = &args.json {
        report.write_json(path)?;
    }
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }

            let toml_str = toml::to_string_pretty(&ScoringConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
