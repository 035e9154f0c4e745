//! # discount-cli
//!
//! Prices a JSON cart with the default discount rules.
//!
//! ## Usage
//! ```bash
//! # Total for a cart file
//! discount-cli cart.json
//!
//! # Read from stdin, print the full breakdown
//! echo '{"items":[{"price":100,"type":"book"}],"user":{"vip":true}}' | discount-cli --breakdown
//!
//! # Treat unusable prices as zero, with rule-level logs
//! DISCOUNT_PRICE_POLICY=coerce DISCOUNT_LOG=discount_core=debug discount-cli cart.json
//! ```

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use discount_core::{default_engine, CartRequest};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

/// Parsed command-line arguments.
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Cart file; `None` reads stdin.
    input: Option<PathBuf>,
    breakdown: bool,
    help: bool,
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    for arg in args {
        match arg.as_str() {
            "-b" | "--breakdown" => parsed.breakdown = true,
            "-h" | "--help" => parsed.help = true,
            "-" => parsed.input = None,
            flag if flag.starts_with('-') => bail!("Unknown option: {flag}"),
            path => {
                if parsed.input.is_some() {
                    bail!("Only one cart file may be given");
                }
                parsed.input = Some(PathBuf::from(path));
            }
        }
    }
    Ok(parsed)
}

fn print_usage() {
    println!("Cart Discount Calculator");
    println!();
    println!("Usage: discount-cli [OPTIONS] [PATH]");
    println!();
    println!("Reads a cart as JSON from PATH (or stdin when PATH is absent or '-'):");
    println!("  {{\"items\": [{{\"price\": 100, \"type\": \"book\"}}], \"user\": {{\"vip\": true}}}}");
    println!();
    println!("Options:");
    println!("  -b, --breakdown    Print the per-line and per-rule breakdown as JSON");
    println!("  -h, --help         Show this help message");
    println!();
    println!("Environment:");
    println!("  DISCOUNT_LOG             tracing filter (default: info)");
    println!("  DISCOUNT_PRICE_POLICY    strict | coerce (default: strict)");
}

fn read_cart(input: Option<&PathBuf>) -> Result<CartRequest> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read cart file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read cart from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Cart is not valid JSON")
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        print_usage();
        return Ok(());
    }

    let config = CliConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .with_context(|| format!("Invalid DISCOUNT_LOG filter '{}'", config.log_filter))?,
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    debug!(?config, "Configuration loaded");

    let cart = read_cart(args.input.as_ref())?;
    let engine = default_engine().with_price_policy(config.price_policy);
    info!(
        items = cart.items.len(),
        vip = cart.user.vip,
        policy = %config.price_policy,
        "Pricing cart"
    );

    if args.breakdown {
        let breakdown = engine
            .calculate_breakdown(&cart.items, &cart.user)
            .context("Failed to price cart")?;
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        let total = engine
            .calculate(&cart.items, &cart.user)
            .context("Failed to price cart")?;
        println!("{total:.2}");
    }

    Ok(())
}
