//! `foresight` command-line driver

mod config;
mod demo;
mod render;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::CliConfig;
use foresight_core::{GateRules, Snapshot, WorkflowStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("foresight")
        .version(foresight_core::VERSION)
        .about("Scenario-planning workflow engine")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("steps")
                .about("List the exercise pipeline")
                .arg(
                    Arg::new("state")
                        .long("state")
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot whose gate status to show"),
                ),
        )
        .subcommand(
            Command::new("walkthrough")
                .about("Run a scripted exercise from pre-read to report")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the playbook as JSON"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the final snapshot to this file"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a snapshot file and show its gate status")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Render the strategic playbook of a snapshot")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    Snapshot::from_json(&text).with_context(|| format!("invalid snapshot {}", path.display()))
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = CliConfig::resolve(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    init_tracing(&config);

    match matches.subcommand() {
        Some(("steps", args)) => {
            let output = match args.get_one::<PathBuf>("state") {
                Some(path) => {
                    let snapshot = load_snapshot(path)?;
                    let gates = GateRules::new(&config.workflow).status(&snapshot.state);
                    render::render_steps(Some(&gates), Some(snapshot.state.progress.current_step))
                }
                None => render::render_steps(None, None),
            };
            print!("{output}");
        }
        Some(("walkthrough", args)) => {
            let store = demo::run_walkthrough(config.workflow.clone()).await?;
            if let Some(path) = args.get_one::<PathBuf>("out") {
                std::fs::write(path, store.snapshot().to_json()?)
                    .with_context(|| format!("writing snapshot {}", path.display()))?;
                tracing::info!(path = %path.display(), "snapshot written");
            }
            let playbook = store.playbook();
            if args.get_flag("json") {
                print_json(&playbook)?;
            } else {
                print!("{}", render::render_playbook(&playbook));
            }
        }
        Some(("check", args)) => {
            let path = path_arg(args, "file")?;
            let snapshot = load_snapshot(path)?;
            let state = &snapshot.state;
            println!(
                "{}: valid snapshot v{} captured {}",
                path.display(),
                snapshot.version,
                snapshot.captured_at.to_rfc3339()
            );
            println!(
                "{} forces ({} rated), {} scenarios, {} actions, {} notes",
                state.forces.len(),
                state.rated_force_count(),
                state.scenarios.len(),
                state.actions.len(),
                state.research_notes.len()
            );
            let gates = GateRules::new(&config.workflow).status(state);
            print!(
                "{}",
                render::render_steps(Some(&gates), Some(state.progress.current_step))
            );
        }
        Some(("report", args)) => {
            let path = path_arg(args, "file")?;
            let store = WorkflowStore::with_config(config.workflow.clone());
            store.restore(load_snapshot(path)?)?;
            let playbook = store.playbook();
            if args.get_flag("json") {
                print_json(&playbook)?;
            } else {
                print!("{}", render::render_playbook(&playbook));
            }
        }
        Some((other, _)) => anyhow::bail!("unknown command {other}"),
        None => anyhow::bail!("no command given"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_report_with_global_config() {
        let matches = cli()
            .try_get_matches_from(["foresight", "-c", "f.toml", "report", "run.json", "--json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("f.toml"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "report");
        assert!(args.get_flag("json"));
    }

    #[tokio::test]
    async fn walkthrough_snapshot_checks_clean() {
        let store = demo::run_walkthrough(foresight_core::WorkflowConfig::default())
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, store.snapshot().to_json().unwrap()).unwrap();
        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.state, store.state());
    }
}
