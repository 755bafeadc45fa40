//! ecfg - inspect and maintain hierarchical configuration keys.

use clap::Parser;
use etcd_configer::cli::{Cli, Commands};
use etcd_configer::commands::{self, Output};
use etcd_configer::config::{BootstrapOverrides, env_lookup, resolve_bootstrap, split_endpoints};
use etcd_configer::storage::open_store;
use etcd_configer::{Error, RawValue};
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `ECFG_LOG=info`.
const LOG_ENV: &str = "ECFG_LOG";

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    init_logging();

    if let Err(e) = run(cli) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn overrides(cli: &Cli) -> Result<BootstrapOverrides, Error> {
    let mut overrides = BootstrapOverrides::new();
    if let Some(ref list) = cli.endpoints {
        overrides = overrides.with_endpoints(split_endpoints(list));
    }
    if let Some(ref root) = cli.root {
        overrides = overrides.with_root_path(root.clone());
    }
    if cli.delete_unused {
        overrides = overrides.with_delete_unused(true);
    }
    if let Some(ref timeout) = cli.timeout {
        let timeout = RawValue::new(timeout.as_str())
            .as_duration()
            .map_err(|e| Error::InvalidInput(format!("--timeout: {}", e)))?;
        overrides = overrides.with_session_timeout(timeout);
    }
    Ok(overrides)
}

fn run(cli: Cli) -> Result<(), Error> {
    let human = cli.human_readable;
    let resolved = resolve_bootstrap(env_lookup, &overrides(&cli)?);
    for warning in &resolved.warnings {
        tracing::warn!("{}", warning);
    }
    let bootstrap = resolved.to_config();
    let store = open_store(&bootstrap, cli.store_file.as_deref())?;
    let store = store.as_ref();
    let timeout = bootstrap.session_timeout;
    let root = bootstrap.root_path.as_str();

    match cli.command {
        Commands::Env => output(&commands::env(resolved, store), human),
        Commands::Scan { prefix } => {
            let result = commands::scan(store, prefix.as_deref().unwrap_or(root), timeout)?;
            output(&result, human);
        }
        Commands::Resolve { prefix } => {
            let result = commands::resolve(store, prefix.as_deref().unwrap_or(root), timeout)?;
            output(&result, human);
        }
        Commands::Put { key, value } => {
            output(&commands::put(store, &key, &value, timeout)?, human);
        }
        Commands::Delete { key } => {
            output(&commands::delete(store, &key, timeout)?, human);
        }
        Commands::Prune {
            prefix,
            keep,
            dry_run,
        } => {
            let prefix = prefix.as_deref().unwrap_or(root);
            output(&commands::prune(store, prefix, keep, dry_run, timeout)?, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
