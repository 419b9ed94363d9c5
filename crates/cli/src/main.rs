//! Fernway CLI - Cart slot inspection and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! fw-cli cart show
//!
//! # Print the unit count (the UI badge value)
//! fw-cli cart count
//!
//! # Add two units of a product
//! fw-cli cart add --id sku-1234 --name "Canvas Tote" --price 24.50 --quantity 2
//!
//! # Remove a product
//! fw-cli cart remove --id sku-1234
//!
//! # Empty the cart
//! fw-cli cart clear
//! ```
//!
//! All commands operate on the durable slot under `FERNWAY_DATA_DIR`
//! (default `./data`), the same slot the storefront reads at startup.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use fernway_cart::config::CartConfig;
use fernway_cart::{CartStore, FileStorage, LineItem};
use fernway_core::ProductId;

#[derive(Parser)]
#[command(name = "fw-cli")]
#[command(author, version, about = "Fernway CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the persisted cart slot
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print all line items and the derived totals
    Show,
    /// Print the total unit count
    Count,
    /// Add an item (merges by id if already present)
    Add {
        /// Product identifier
        #[arg(short, long)]
        id: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Per-unit price, e.g. 24.50
        #[arg(short, long)]
        price: Decimal,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove an item by id
    Remove {
        /// Product identifier
        #[arg(short, long)]
        id: String,
    },
    /// Empty the cart
    Clear,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;
    let storage = FileStorage::new(config.data_dir)?;
    let mut store = CartStore::open(storage);

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => show(&store),
            CartAction::Count => println!("{}", store.item_count()),
            CartAction::Add {
                id,
                name,
                price,
                quantity,
            } => {
                store.add_item(LineItem {
                    id: ProductId::new(id),
                    name,
                    unit_price: price,
                    image_refs: Vec::new(),
                    quantity,
                });
                show(&store);
            }
            CartAction::Remove { id } => {
                let id = ProductId::new(id);
                if store.remove_item(&id) {
                    println!("Removed {id}");
                } else {
                    println!("No item with id {id}");
                }
            }
            CartAction::Clear => {
                store.clear();
                println!("Cart cleared");
            }
        },
    }

    Ok(())
}

fn show<S: fernway_cart::CartStorage>(store: &CartStore<S>) {
    if store.items().is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in store.items() {
        println!(
            "{:<20} {:<30} {:>4} x {}",
            item.id, item.name, item.quantity, item.unit_price
        );
    }
    println!("items: {}  total: {}", store.item_count(), store.total());
}
