use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::errors::Error;
use crate::purchase_engine::PurchaseAggregator;

mod csv_tables;
mod errors;
mod json_handler;
mod purchase_engine;

const BATCH_EXTENSION: &str = "json";
const REPORT_FILE_NAME: &str = "output.json";

/// Joins the customer and product reference tables against transaction batch
/// logs and reports purchase counts per customer and product.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Path to the customers CSV table
    #[arg(long, default_value = "input_data/starter/customers.csv")]
    customers_location: PathBuf,
    /// Path to the products CSV table
    #[arg(long, default_value = "input_data/starter/products.csv")]
    products_location: PathBuf,
    /// Root directory holding transaction batch subdirectories
    #[arg(long, default_value = "input_data/starter/transactions")]
    transactions_location: PathBuf,
    /// Directory the report is written into
    #[arg(long, default_value = "output_data/outputs")]
    output_location: PathBuf,
    /// Accumulate purchase counts across all batch files instead of rewriting
    /// the report for each file
    #[arg(long)]
    accumulate: bool,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    if !args.customers_location.is_file() || !args.products_location.is_file() {
        println!("Customers or products file does not exist.");
        return Ok(());
    }
    if !args.transactions_location.is_dir() {
        println!("Transactions directory does not exist.");
        return Ok(());
    }
    if !args.output_location.is_dir() {
        fs::create_dir_all(&args.output_location)?;
    }

    run(&args)
}

fn run(args: &Args) -> Result<(), Error> {
    let customers = csv_tables::load_customers(&args.customers_location)?;
    let products = csv_tables::load_products(&args.products_location)?;
    let report_path = args.output_location.join(REPORT_FILE_NAME);

    let batch_files =
        json_handler::discover_batch_files(&args.transactions_location, BATCH_EXTENSION)?;
    info!(
        "Discovered {} transaction batch files under {}.",
        batch_files.len(),
        args.transactions_location.display()
    );

    if args.accumulate {
        let mut aggregator = PurchaseAggregator::default();
        for path in &batch_files {
            let transactions = json_handler::load_transaction_file(path)?;
            aggregator.load_transactions(&customers, &products, transactions);
        }
        json_handler::write_report(&report_path, aggregator.rows(&customers))?;
    } else {
        // Each batch rewrites the report in full; the last file in traversal
        // order wins.
        for path in &batch_files {
            let transactions = json_handler::load_transaction_file(path)?;
            let rows = purchase_engine::aggregate(&customers, &products, transactions);
            json_handler::write_report(&report_path, rows)?;
        }
    }
    Ok(())
}
