//! Command-line parsing for the EPH series tool.
//!
//! Argument parsing and command dispatch stay separate from the statistics
//! and aggregation code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod menu;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "eph",
    version,
    about = "Weighted labor-market and income series from EPH microdata (NEA)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Activity, employment and unemployment rates for one year's waves.
    Rates(YearArgs),
    /// Weighted income distribution summaries for one year's waves.
    Income(YearArgs),
    /// Rate and income evolution over the 2016-2024 totals directory.
    Evolution(CommonArgs),
    /// Interactive menu (the default when no subcommand is given).
    Menu(CommonArgs),
}

/// Options shared by every analysis.
#[derive(Debug, Parser, Clone, Default)]
pub struct CommonArgs {
    /// Root of the survey data tree. Defaults to $EPH_DATA_DIR (a `.env`
    /// file next to the binary works too).
    #[arg(short = 'd', long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Join individual rows to the household file and keep private
    /// dwellings only.
    #[arg(long)]
    pub private_dwellings: bool,

    /// Render SVG charts into this directory.
    #[arg(long, value_name = "DIR")]
    pub charts: Option<PathBuf>,

    /// Export the computed series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full run output to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for single-year analyses.
#[derive(Debug, Parser, Clone)]
pub struct YearArgs {
    /// Survey year to analyze.
    #[arg(short = 'y', long, value_parser = clap::value_parser!(u16).range(2016..=2024))]
    pub year: u16,

    #[command(flatten)]
    pub common: CommonArgs,
}
