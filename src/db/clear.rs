//! Implementation of `db clear` subcommand.

use crate::store::Warehouse;

/// Command line arguments for `db clear` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "remove all rows from the warehouse tables", long_about = None)]
pub struct Args {
    /// Path to the SQLite warehouse.
    #[arg(long)]
    pub path_db: String,
}

/// Main entry point for `db clear` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let mut warehouse = Warehouse::open(&args.path_db, false)?;
    warehouse.ensure_schema()?;
    warehouse.clear()?;
    tracing::info!("cleared all tables of {}", &args.path_db);

    Ok(())
}
