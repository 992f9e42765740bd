use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;
mod dataset;
mod render;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula data-grid search demo", long_about = None)]
#[command(version)]
struct Cli {
    /// Dataset file (JSON); defaults to the embedded person/job sample
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Search the grid and print it with highlight markers
    Search {
        /// The text to find
        term: String,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// Match whole cell text only
        #[arg(long)]
        exact: bool,

        /// Advance the active match this many times
        #[arg(long, default_value_t = 1)]
        steps: usize,

        /// Keep only rows whose COLUMN contains TEXT (format: COLUMN=TEXT)
        #[arg(long)]
        filter: Option<String>,

        /// Sort by column id; prefix with '-' for descending
        #[arg(long)]
        sort: Option<String>,

        /// Group by column id
        #[arg(long)]
        group: Option<String>,

        /// Page size (display slots per page)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// List the match records for a term
    Matches {
        term: String,

        #[arg(long)]
        case_sensitive: bool,

        #[arg(long)]
        exact: bool,
    },

    /// Print the embedded sample dataset as JSON
    Sample,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let json = match &cli.data {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?,
        None => dataset::SAMPLE.to_string(),
    };

    match cli.action {
        Action::Search {
            term,
            case_sensitive,
            exact,
            steps,
            filter,
            sort,
            group,
            page_size,
        } => {
            let mut grid = dataset::build_grid(&json)?;
            commands::search::run(
                &mut grid,
                &commands::search::SearchArgs {
                    term,
                    case_sensitive,
                    exact,
                    steps,
                    filter,
                    sort,
                    group,
                    page_size,
                },
            )
        }
        Action::Matches {
            term,
            case_sensitive,
            exact,
        } => {
            let mut grid = dataset::build_grid(&json)?;
            commands::matches::run(&mut grid, &term, case_sensitive, exact);
            Ok(())
        }
        Action::Sample => {
            commands::sample::run();
            Ok(())
        }
    }
}
