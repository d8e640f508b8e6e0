//! Basket CLI - Drive a file-backed cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Add two black tees at $19.99
//! basket add --sku TEE-BLK-M --quantity 2 --price 19.99 --name "Black Tee"
//!
//! # Change the quantity of a line
//! basket update --sku TEE-BLK-M --quantity 3
//!
//! # Remove a line, or empty the cart
//! basket remove --sku TEE-BLK-M
//! basket clear
//!
//! # Print the cart (or its stored JSON payload)
//! basket show
//! basket show --json
//! ```
//!
//! # Commands
//!
//! - `show` - Print lines, subtotal, shipping, and total
//! - `add` - Add a line (merging with an existing line for the same sku)
//! - `update` - Set the quantity of a line
//! - `remove` - Remove a line
//! - `clear` - Remove every line
//!
//! Configuration comes from `BASKET_*` environment variables (see
//! `basket_cart::config`); `--dir` overrides `BASKET_STORAGE_DIR`. Set
//! `BASKET_LOG_JSON` to log JSON lines to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]
// The CLI reports cart state on stdout
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use basket_cart::CartConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{AddArgs, Session};

#[derive(Parser)]
#[command(name = "basket")]
#[command(author, version, about = "Basket cart tools")]
struct Cli {
    /// Directory holding the stored cart
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show {
        /// Print the stored JSON payload instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Add a line to the cart
    Add(AddArgs),
    /// Set the quantity of a line
    Update {
        /// Product variant identifier
        #[arg(short, long)]
        sku: String,

        /// New quantity; 0 removes the line
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        /// Product variant identifier
        #[arg(short, long)]
        sku: String,
    },
    /// Remove every line
    Clear,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "basket_cli=info,basket_cart=info".into());

    // JSON lines when BASKET_LOG_JSON is set, text otherwise; stdout is for cart output
    let use_json = std::env::var_os("BASKET_LOG_JSON").is_some();
    let json_layer = use_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!use_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CartConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config.storage_dir = dir;
    }

    let session = Session::open(&config)?;

    let outcome = match cli.command {
        Commands::Show { json } => commands::show(&session.cart, json),
        Commands::Add(args) => commands::add(&session.cart, args),
        Commands::Update { sku, quantity } => commands::update(&session.cart, &sku, quantity),
        Commands::Remove { sku } => commands::remove(&session.cart, &sku),
        Commands::Clear => commands::clear(&session.cart),
    };

    // Let the pending write land even when the command failed
    session.close().await;

    println!("{}", outcome?);
    Ok(())
}
