// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modelgate - chat request router.
//!
//! This is the binary entry point.

mod demo;
mod inspect;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use modelgate_config::ModelgateConfig;
use modelgate_core::StrategyKind;
use modelgate_ratelimit::LimiterProfile;

/// Modelgate - chat request router.
#[derive(Parser, Debug)]
#[command(name = "modelgate", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a prompt.
    Classify {
        text: String,
        /// Treat the prompt as carrying attachments.
        #[arg(long)]
        attachments: bool,
    },
    /// Classify a prompt and select a model for it.
    Route {
        text: String,
        #[arg(long, default_value = "free")]
        plan: String,
        /// Remaining budget in USD.
        #[arg(long, default_value_t = 1.0)]
        budget: f64,
        /// Override the configured strategy (affinity, weighted).
        #[arg(long)]
        strategy: Option<StrategyKind>,
        /// Comma-separated available model ids. Defaults to the catalog.
        #[arg(long, value_delimiter = ',')]
        available: Vec<String>,
        #[arg(long)]
        attachments: bool,
    },
    /// Run rate-limit checks for one caller.
    Check {
        #[arg(long, default_value = "127.0.0.1")]
        address: String,
        #[arg(long)]
        identity: String,
        /// Limiter profile (chat, api, payment, newsletter).
        #[arg(long, default_value = "chat")]
        profile: LimiterProfile,
        /// Number of consecutive requests to simulate.
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Manage modelgate configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Route prompts read from stdin (`<identity> <text>` per line).
    ServeDemo {
        /// Plan assigned to every identity.
        #[arg(long, default_value = "free")]
        plan: String,
        #[arg(long, default_value_t = 1.0)]
        budget: f64,
        /// Reload the `--config` file when it changes.
        #[arg(long, requires = "config")]
        watch: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration, reporting every problem.
    Validate,
}

fn load_config(path: Option<&PathBuf>) -> ModelgateConfig {
    let loaded = match path {
        Some(path) => modelgate_config::load_and_validate_path(path),
        None => modelgate_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            modelgate_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level. Logs go to stderr so stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("modelgate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.gateway.log_level);

    let result = match cli.command {
        Commands::Classify { text, attachments } => {
            inspect::run_classify(&config, &text, attachments, cli.json)
        }
        Commands::Route {
            text,
            plan,
            budget,
            strategy,
            available,
            attachments,
        } => inspect::run_route(
            &config,
            inspect::RouteArgs {
                text: &text,
                plan: &plan,
                budget,
                strategy,
                available: &available,
                attachments,
            },
            cli.json,
        ),
        Commands::Check {
            address,
            identity,
            profile,
            count,
        } => inspect::run_check(&config, &address, &identity, profile, count, cli.json),
        Commands::Config {
            action: ConfigCommand::Validate,
        } => {
            println!("configuration is valid");
            Ok(())
        }
        Commands::ServeDemo {
            plan,
            budget,
            watch,
        } => {
            let watch_path = if watch { cli.config.clone() } else { None };
            demo::run_serve_demo(config, &plan, budget, watch_path).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn route_parses_strategy_and_available_list() {
        let cli = Cli::try_parse_from([
            "modelgate",
            "route",
            "hello",
            "--plan",
            "vn_pro",
            "--strategy",
            "affinity",
            "--available",
            "gpt-4o,claude-3-opus",
        ])
        .unwrap();
        match cli.command {
            Commands::Route {
                plan,
                strategy,
                available,
                ..
            } => {
                assert_eq!(plan, "vn_pro");
                assert_eq!(strategy, Some(StrategyKind::Affinity));
                assert_eq!(available, vec!["gpt-4o", "claude-3-opus"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_parses_profile() {
        let cli = Cli::try_parse_from([
            "modelgate",
            "check",
            "--identity",
            "u1",
            "--profile",
            "newsletter",
            "--count",
            "4",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Check {
                profile: LimiterProfile::Newsletter,
                count: 4,
                ..
            }
        ));
    }

    #[test]
    fn watch_requires_config() {
        assert!(Cli::try_parse_from(["modelgate", "serve-demo", "--watch"]).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = modelgate_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.gateway.name, "modelgate");
    }
}
