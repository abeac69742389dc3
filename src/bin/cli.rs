//! druid-query CLI
//!
//! Command-line interface for broker queries:
//! - Run a raw JSON query file
//! - Print post-aggregation dependencies
//! - Generate a default config

use anyhow::Context;
use clap::{Parser, Subcommand};
use druid_query::config::{default_config_paths, generate_default_config, Config, LoggingConfig};
use druid_query::model::{unresolved_references, Aggregation, PostAggregation};
use druid_query::{DruidClient, Query};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "druid-query")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and run queries against a Druid broker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Broker query endpoint (overrides config)
    #[arg(long, global = true)]
    pub broker: Option<String>,

    /// Config file (default: platform config dir, then ./druid-query.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a raw JSON query and print the decoded rows
    Run {
        /// Path to the query file
        file: PathBuf,
        /// Print the raw request and response after the run
        #[arg(long)]
        debug: bool,
    },

    /// Print the dependency edges of post-aggregations
    Deps {
        /// Path to a post-aggregation object or array, or a whole query
        file: PathBuf,
    },

    /// Write a default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Input accepted by `deps`
#[derive(Deserialize)]
#[serde(untagged)]
enum DepsInput {
    Query {
        #[serde(default)]
        aggregations: Vec<Aggregation>,
        #[serde(rename = "postAggregations")]
        post_aggregations: Vec<PostAggregation>,
    },
    Many(Vec<PostAggregation>),
    One(PostAggregation),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref(), default_config_paths(), std::io::stderr)?;
    if let Some(broker) = cli.broker {
        config.broker.url = broker;
    }

    init_logging(&config.logging);

    match cli.command {
        Commands::Run { file, debug } => {
            let raw = read_file(&file)?;
            let query = Query::from_json(&raw)
                .with_context(|| format!("Invalid query in {:?}", file))?;

            config.broker.debug |= debug;
            let client = DruidClient::new(config.broker)?;

            tracing::info!(
                query_type = query.tag(),
                data_source = query.data_source(),
                broker = %client.config().url,
                "Running query"
            );

            let outcome = client.execute(&query).await;

            if debug {
                if let Some(exchange) = client.last_exchange().await {
                    eprintln!("--- request ---");
                    eprintln!("{}", exchange.request);
                    eprintln!("--- response ---");
                    eprintln!("{}", exchange.response.as_deref().unwrap_or("<none>"));
                }
            }

            let results = outcome.with_context(|| format!("{} query failed", query.tag()))?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Deps { file } => {
            let raw = read_file(&file)?;
            let input: DepsInput = serde_json::from_str(&raw)
                .with_context(|| format!("No post-aggregations in {:?}", file))?;

            let (aggregations, post_aggregations) = match input {
                DepsInput::Query {
                    aggregations,
                    post_aggregations,
                } => (aggregations, post_aggregations),
                DepsInput::Many(post_aggregations) => (Vec::new(), post_aggregations),
                DepsInput::One(post_aggregation) => (Vec::new(), vec![post_aggregation]),
            };

            println!("{:<24} {}", "Name", "Refers to");
            println!("{}", "-".repeat(48));
            for post_aggregation in &post_aggregations {
                for dep in post_aggregation.dependencies()? {
                    println!("{:<24} {}", dep.name, dep.refer);
                }
            }

            if !aggregations.is_empty() {
                let missing = unresolved_references(&aggregations, &post_aggregations)?;
                println!();
                if missing.is_empty() {
                    println!("All references resolve.");
                } else {
                    println!("Unresolved: {}", missing.join(", "));
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Load the config while a provisional subscriber is active, since the
/// configured one depends on what gets loaded.
fn load_config<W>(
    path: Option<&Path>,
    candidates: Vec<PathBuf>,
    writer: W,
) -> anyhow::Result<Config>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let provisional = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(writer)
        .finish();

    tracing::subscriber::with_default(provisional, || -> anyhow::Result<Config> {
        match path {
            Some(path) => Ok(Config::load_with_env(path)?),
            None => Ok(Config::load_first(candidates)),
        }
    })
}

fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

fn init_logging(logging: &LoggingConfig) {
    let filter = env_filter(&logging.level);

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}
