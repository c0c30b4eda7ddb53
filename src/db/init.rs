//! Implementation of `db init` subcommand.

use crate::store::Warehouse;

/// Command line arguments for `db init` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "create the warehouse tables", long_about = None)]
pub struct Args {
    /// Path to the SQLite warehouse, created if missing.
    #[arg(long)]
    pub path_db: String,
}

/// Main entry point for `db init` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let warehouse = Warehouse::open(&args.path_db, true)?;
    warehouse.init_schema()?;
    warehouse.ensure_schema()?;
    tracing::info!("warehouse {} is ready", &args.path_db);

    Ok(())
}
