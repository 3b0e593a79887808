//! Quote Example
//!
//! Prices a fixture cart, evaluates its promotions and prints the quote.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to replace the fixture cart's coupon codes

use std::{io, time::Instant};

use anyhow::Result;
use clap::Parser;
use jiff::Timestamp;
use pricebook::{fixtures::Fixture, lookups::UsageSnapshot, promotions::Usage, quote::Quoter};

/// Arguments for the quote example
#[derive(Debug, Parser)]
struct QuoteArgs {
    /// Fixture set to load
    #[arg(short, long, default_value = "lunch")]
    fixture: String,

    /// Coupon codes to enter instead of the fixture cart's own
    #[arg(short, long)]
    coupon: Vec<String>,
}

/// Quote Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = QuoteArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let mut cart = fixture.cart()?.clone();

    if !args.coupon.is_empty() {
        cart.coupon_codes = args.coupon;
    }

    let usage = UsageSnapshot::default();
    let quoter = Quoter::new(
        fixture.catalog(),
        fixture.price_list(),
        fixture.promotions(),
        fixture.currency()?,
    );

    let start = Instant::now();
    let quote = quoter.quote(&cart, Usage::new(&usage, &usage), Timestamp::now())?;
    let elapsed = start.elapsed().as_secs_f32();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    quote.write_to(&mut handle)?;

    println!("Quoted in {elapsed}s");

    Ok(())
}
