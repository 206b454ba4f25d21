//! Creator Storefront CLI - session migrations and local cart tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session store table
//! csf-cli migrate
//!
//! # Inspect and edit a local cart file
//! csf-cli cart --file cart.json show
//! csf-cli cart --file cart.json add --product-id p1 --variant-id 4242 --price 20.00
//! csf-cli cart --file cart.json checkout-url --shop creator.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the tower-sessions table used by the storefront
//! - `cart` - Run cart, lifecycle and checkout operations against a JSON file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use creator_storefront_core::{
    CartItem, CheckoutInitiator, CreatorRef, CustomerInfo, Email, Price, ProductId, ReloadPolicy,
    VariantId,
};
use rust_decimal::Decimal;
use serde::Serialize;
use url::Url;

mod cart_file;
mod commands;
mod error;

use cart_file::CartFile;
use error::CliError;

#[derive(Parser)]
#[command(name = "csf-cli")]
#[command(author, version, about = "Creator Storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// Operate on a local cart file
    Cart {
        /// Cart file (created on first write)
        #[arg(short, long, default_value = "cart.json")]
        file: PathBuf,

        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart summary
    Show,
    /// Add a line, or bump the matching line by one
    Add {
        #[arg(long)]
        product_id: String,
        #[arg(long)]
        variant_id: String,
        /// Unit price, e.g. 20.00
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value = "")]
        handle: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        size: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long, env = "CREATOR_REF")]
        creator_ref: Option<String>,
    },
    /// Change a line's quantity
    Adjust {
        #[arg(long)]
        index: usize,
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },
    /// Empty the cart
    Clear,
    /// Replay a page load (runs the lifecycle policy)
    PageLoad {
        #[arg(long, default_value = "/")]
        path: String,
        /// `preserve` or `clear`
        #[arg(long, env = "STOREFRONT_RELOAD_POLICY", default_value = "preserve")]
        policy: ReloadPolicy,
    },
    /// Print the checkout URL and mark the session as mid-checkout
    CheckoutUrl {
        /// Shop domain or URL
        #[arg(long, env = "SHOPIFY_STORE")]
        shop: String,
        #[arg(long)]
        email: Option<String>,
        /// Referral attribution
        #[arg(long = "ref")]
        referral: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creator_storefront_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await,
        Commands::Cart { file, action } => {
            let mut file = CartFile::open(file)?;
            run_cart(&mut file, action)?;
            file.save()
        }
    }
}

fn run_cart(file: &mut CartFile, action: CartAction) -> Result<(), CliError> {
    match action {
        CartAction::Show => print_json(&commands::cart::show(file)),
        CartAction::Add {
            product_id,
            variant_id,
            price,
            handle,
            title,
            size,
            quantity,
            creator_ref,
        } => {
            if price.is_sign_negative() {
                return Err(CliError::InvalidArgument("--price", "cannot be negative".to_string()));
            }
            if price > Price::MAX_AMOUNT {
                return Err(CliError::InvalidArgument(
                    "--price",
                    format!("cannot exceed {}", Price::MAX_AMOUNT),
                ));
            }
            let item = CartItem {
                product_id: ProductId::new(product_id),
                variant_id: VariantId::new(variant_id),
                handle,
                title,
                unit_price: price,
                size,
                image_url: None,
                quantity,
                creator_ref: creator_ref.map(CreatorRef::new),
            };
            print_json(&commands::cart::add(file, item)?)
        }
        CartAction::Adjust { index, delta } => {
            print_json(&commands::cart::adjust(file, index, delta)?)
        }
        CartAction::Clear => print_json(&commands::cart::clear(file)?),
        CartAction::PageLoad { path, policy } => {
            print_json(&commands::cart::page_load(file, &path, policy)?)
        }
        CartAction::CheckoutUrl {
            shop,
            email,
            referral,
        } => {
            let initiator = CheckoutInitiator::new(parse_shop(&shop)?);
            let customer = CustomerInfo {
                email: email
                    .map(|e| Email::parse(&e))
                    .transpose()
                    .map_err(|e| CliError::InvalidArgument("--email", e.to_string()))?,
                ..CustomerInfo::default()
            };
            match commands::cart::checkout_url(file, &initiator, &customer, referral.as_deref())? {
                Some(target) => print_line(target.as_str()),
                None => tracing::warn!("Cart is empty, nothing to check out"),
            }
            Ok(())
        }
    }
}

fn parse_shop(shop: &str) -> Result<Url, CliError> {
    let shop = shop.trim().trim_end_matches('/');
    let candidate = if shop.contains("://") {
        shop.to_string()
    } else {
        format!("https://{shop}")
    };
    Url::parse(&candidate).map_err(|e| CliError::InvalidArgument("--shop", e.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    print_line(&serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use creator_storefront_core::Storage;
    use creator_storefront_core::storage::keys;

    use super::*;

    #[test]
    fn test_parse_shop() {
        assert_eq!(
            parse_shop("creator.myshopify.com/").unwrap().as_str(),
            "https://creator.myshopify.com/"
        );
        assert!(parse_shop("http://").is_err());
    }

    #[test]
    fn test_cli_parses_negative_delta() {
        let cli = Cli::try_parse_from([
            "csf-cli", "cart", "--file", "c.json", "adjust", "--index", "0", "--delta", "-2",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Adjust { index: 0, delta: -2 },
                ..
            }
        ));
    }

    #[test]
    fn test_add_rejects_oversized_price() {
        let mut file = CartFile::open(std::env::temp_dir().join("csf-cli-oversized.json")).unwrap();
        let action = CartAction::Add {
            product_id: "p1".to_string(),
            variant_id: "v1".to_string(),
            price: Decimal::MAX,
            handle: String::new(),
            title: String::new(),
            size: String::new(),
            quantity: 2,
            creator_ref: None,
        };

        let err = run_cart(&mut file, action).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument("--price", _)));
        assert!(file.local.get(keys::CART).unwrap().is_none());
    }
}
