//! # apportion
//!
//! Command line front end for the allocation engine.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apportion allocate --request order.json --catalog catalog.json        │
//! │                                                                         │
//! │  Settings::load ──► CatalogFixture ──► AllocationEngine::allocate      │
//! │                                               │                         │
//! │                       ┌───────────────────────┴──────────────┐          │
//! │                       ▼                                      ▼          │
//! │              AllocationResponse (exit 0)        ApiError JSON (exit 1)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Results go to stdout; logs go to stderr and honour `RUST_LOG`.

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use apportion_catalog::{CatalogFixture, CatalogRepository, TaxSettingRepository};
use apportion_core::Currency;
use apportion_engine::{AllocationEngine, AllocationRequest, ApiError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser)]
#[command(
    name = "apportion",
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[arg(long, global = true, help = "(Optional) Settings file. Defaults to ./apportion.toml")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Allocate one request and print the response
    Allocate {
        #[arg(long, short, help = "Request JSON file, or - for stdin")]
        request: String,

        #[arg(long, help = "(Optional) Catalog fixture JSON. Overrides catalog_path")]
        catalog: Option<PathBuf>,

        #[arg(long, help = "Pretty-print the output")]
        pretty: bool,
    },

    /// Show how a currency is rounded
    Currency { code: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyInfo {
    code: String,
    fraction_digits: u32,
    minimal_unit: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,apportion=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Allocate {
            request,
            catalog,
            pretty,
        } => {
            let settings = Settings::load(cli.config.as_deref())?;
            allocate(&settings, &request, catalog.as_deref(), pretty)
        }
        Command::Currency { code } => {
            let currency = Currency::from_code(&code)?;
            print_json(
                &CurrencyInfo {
                    code: currency.code.clone(),
                    fraction_digits: currency.fraction_digits,
                    minimal_unit: currency.minimal_unit().to_string(),
                },
                true,
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn allocate(settings: &Settings, source: &str, catalog: Option<&Path>, pretty: bool) -> Result<ExitCode> {
    let (catalog, taxes) = load_catalog(catalog.or(settings.catalog_path.as_deref()))?;
    let request = read_request(source)?;

    let engine = AllocationEngine::new(&catalog, &taxes, settings.to_engine_options());
    match engine.allocate(&request) {
        Ok(response) => {
            print_json(&response, pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_json(&ApiError::from(err), pretty)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<(CatalogRepository, TaxSettingRepository)> {
    match path {
        Some(path) => {
            let fixture = CatalogFixture::from_path(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            let (catalog, taxes) = fixture.into_repositories();
            let (variants, products, combos, packsizes) = catalog.counts();
            info!(variants, products, combos, packsizes, tax_settings = taxes.len(), "Catalog loaded");
            Ok((catalog, taxes))
        }
        None => {
            warn!("No catalog configured; only custom lines can be allocated");
            Ok((CatalogRepository::new(), TaxSettingRepository::new()))
        }
    }
}

fn read_request(source: &str) -> Result<AllocationRequest> {
    let json = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read request {source}"))?
    };
    serde_json::from_str(&json).with_context(|| format!("Request {source} is not a valid allocation request"))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_allocate() {
        let cli = Cli::try_parse_from(["apportion", "allocate", "-r", "-", "--pretty", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Command::Allocate {
                request,
                catalog,
                pretty,
            } => {
                assert_eq!(request, "-");
                assert!(catalog.is_none());
                assert!(pretty);
            }
            Command::Currency { .. } => panic!("expected allocate"),
        }
    }

    #[test]
    fn test_missing_catalog_is_empty() {
        let (catalog, taxes) = load_catalog(None).unwrap();
        assert_eq!(catalog.counts(), (0, 0, 0, 0));
        assert!(taxes.is_empty());
    }
}
