//! snowsync command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use snowsync_bridge::{ArtifactSyncBridge, BridgeConfig, RecordGateway};
use snowsync_registry::ArtifactTypeRegistry;
use snowsync_servicenow::{InstanceConfig, ServiceNowGateway};
use snowsync_validation::ValidationPolicy;
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod command;
mod session;

fn cli() -> Command {
    Command::new("snowsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Edit ServiceNow records as local files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(Command::new("tables").about("List supported tables"))
        .subcommand(
            Command::new("session")
                .about("Run an interactive sync session")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML file with artifacts_dir and validation_policy"),
                )
                .arg(
                    Arg::new("artifacts-dir")
                        .long("artifacts-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory artifacts are written under"),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .value_parser(|s: &str| s.parse::<ValidationPolicy>())
                        .help("advisory, block_on_errors or strict"),
                )
                .arg(
                    Arg::new("offline")
                        .long("offline")
                        .value_name("FIXTURES")
                        .value_parser(value_parser!(PathBuf))
                        .help("Serve records from a JSON file instead of an instance"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("tables", _)) => {
            for table in ArtifactTypeRegistry::with_defaults().list_supported_tables() {
                println!("{table}");
            }
            Ok(())
        }
        Some(("session", args)) => {
            let config = bridge_config(args).await?;
            let registry = ArtifactTypeRegistry::with_defaults();
            if let Some(path) = args.get_one::<PathBuf>("offline") {
                let gateway = session::load_fixtures(path).await?;
                info!(fixtures = %path.display(), "offline session");
                start(ArtifactSyncBridge::new(gateway, registry, config)).await
            } else {
                let instance = InstanceConfig::from_env().context("instance configuration")?;
                info!(instance = %instance.base_url, "connecting");
                let gateway = ServiceNowGateway::new(instance)?;
                start(ArtifactSyncBridge::new(gateway, registry, config)).await
            }
        }
        _ => Ok(()),
    }
}

async fn bridge_config(args: &ArgMatches) -> anyhow::Result<BridgeConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => BridgeConfig::load(path).await?,
        None => BridgeConfig::from_env(),
    };
    if let Some(dir) = args.get_one::<PathBuf>("artifacts-dir") {
        config = config.with_artifacts_dir(dir);
    }
    if let Some(policy) = args.get_one::<ValidationPolicy>("policy") {
        config = config.with_policy(*policy);
    }
    Ok(config)
}

async fn start<G: RecordGateway>(bridge: ArtifactSyncBridge<G>) -> anyhow::Result<()> {
    let interactive = std::io::stdin().is_terminal();
    if interactive {
        println!("snowsync {} - 'help' lists commands", env!("CARGO_PKG_VERSION"));
    }
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    session::run(&bridge, input, &mut out, interactive).await
}
