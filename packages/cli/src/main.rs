#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the ZAN dashboard.
//!
//! ```text
//! zan_dashboard serve [--bind 0.0.0.0] [--port 8080]
//! zan_dashboard metrics [--perimetre cc] [--departements 26,07]
//! zan_dashboard top [-n 5]
//! zan_dashboard risques [-n 5]
//! zan_dashboard filters [--perimetre scot] [--departements 26]
//! zan_dashboard benchmark [--departements 26] [--typologies 11]
//! zan_dashboard perimeters
//! ```
//!
//! Reports are printed as JSON. The data directory comes from `--data-dir`,
//! then `ZAN_DATA_DIR`, then `data`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use zan_dashboard_analytics::filter::filter;
use zan_dashboard_analytics::{benchmark, metrics, options, ranking, require, resolve_perimeter};
use zan_dashboard_analytics_models::FilterSelector;
use zan_dashboard_commune_models::Dataset;
use zan_dashboard_dataset::context::DatasetContext;
use zan_dashboard_dataset::registry::all_definitions;
use zan_dashboard_server::{ServerConfig, run_server};
use zan_dashboard_server_models::{DEFAULT_LIMIT, DEFAULT_PERIMETER, split_list};

#[derive(Parser)]
#[command(
    name = "zan_dashboard",
    about = "ZAN land-artificialization metrics for the SCoT and CC perimeters"
)]
struct Cli {
    /// Directory holding the perimeter CSV exports
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the aggregate metrics of a perimeter
    Metrics(SelectionArgs),
    /// Print the most artificialized communes
    Top {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Number of communes
        #[arg(short, default_value_t = DEFAULT_LIMIT)]
        n: usize,
    },
    /// Print the communes that used the largest share of their allowance
    Risques {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Number of communes
        #[arg(short, default_value_t = DEFAULT_LIMIT)]
        n: usize,
    },
    /// Print the values available to each filter
    Filters {
        /// Perimeter: scot or cc
        #[arg(long, default_value = DEFAULT_PERIMETER)]
        perimetre: String,
        /// Comma-separated departments restricting the commune list
        #[arg(long)]
        departements: Option<String>,
    },
    /// Compare both perimeters under the same filters
    Benchmark(SelectorArgs),
    /// List the registered perimeters and whether they load
    Perimeters,
}

#[derive(Args)]
struct SelectionArgs {
    /// Perimeter: scot or cc
    #[arg(long, default_value = DEFAULT_PERIMETER)]
    perimetre: String,
    #[command(flatten)]
    filters: SelectorArgs,
}

impl SelectionArgs {
    fn selector(&self) -> FilterSelector {
        self.filters.selector()
    }
}

#[derive(Args)]
struct SelectorArgs {
    /// Comma-separated department ids
    #[arg(long)]
    departements: Option<String>,
    /// Comma-separated commune ids
    #[arg(long)]
    communes: Option<String>,
    /// Comma-separated typology codes or labels
    #[arg(long)]
    typologies: Option<String>,
}

impl SelectorArgs {
    fn selector(&self) -> FilterSelector {
        FilterSelector {
            departments: split_list(self.departements.as_deref()),
            communes: split_list(self.communes.as_deref()),
            typologies: split_list(self.typologies.as_deref()),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolves `perimetre` in `context` and prints what `build` makes of
/// its dataset.
fn report<T: Serialize>(
    context: &DatasetContext,
    perimetre: &str,
    build: impl FnOnce(&Dataset) -> T,
) -> Result<(), Box<dyn std::error::Error>> {
    let perimeter = resolve_perimeter(perimetre)?;
    let dataset = require(context.dataset(perimeter), perimeter)?;
    print_json(&build(dataset))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let env_config = ServerConfig::from_env();
    let data_dir = cli.data_dir.unwrap_or_else(|| env_config.data_dir.clone());
    let load = || {
        log::debug!("Loading datasets from {}", data_dir.display());
        DatasetContext::load(&data_dir)
    };

    match cli.command {
        Commands::Serve { bind, port } => {
            let config = ServerConfig {
                bind_addr: bind.unwrap_or(env_config.bind_addr),
                port: port.unwrap_or(env_config.port),
                data_dir: data_dir.clone(),
                ..env_config
            };
            // The server brings its own actix runtime.
            actix_web::rt::System::new().block_on(run_server(config))?;
        }
        Commands::Metrics(selection) => report(&load(), &selection.perimetre, |dataset| {
            metrics::compute_metrics(&filter(dataset, &selection.selector())).rounded()
        })?,
        Commands::Top { selection, n } => report(&load(), &selection.perimetre, |dataset| {
            ranking::top_communes(&filter(dataset, &selection.selector()), n)
        })?,
        Commands::Risques { selection, n } => report(&load(), &selection.perimetre, |dataset| {
            ranking::risk_classification(&filter(dataset, &selection.selector()), n)
        })?,
        Commands::Filters {
            perimetre,
            departements,
        } => report(&load(), &perimetre, |dataset| {
            options::filter_options(dataset, &split_list(departements.as_deref()))
        })?,
        Commands::Benchmark(filters) => {
            let context = load();
            print_json(&benchmark::benchmark(
                |perimeter| context.dataset(perimeter),
                &filters.selector(),
            )?)?;
        }
        Commands::Perimeters => {
            let context = load();
            let perimeters: Vec<serde_json::Value> = all_definitions()
                .iter()
                .map(|definition| {
                    let dataset = context.dataset(definition.id);
                    serde_json::json!({
                        "id": definition.id,
                        "name": definition.name,
                        "short_label": definition.short_label,
                        "file": definition.data_path(&data_dir).display().to_string(),
                        "loaded": dataset.is_some(),
                        "communes": dataset.map_or(0, Dataset::len),
                    })
                })
                .collect();
            print_json(&perimeters)?;
        }
    }

    Ok(())
}
