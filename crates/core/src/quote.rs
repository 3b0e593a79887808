//! Quote
//!
//! Prices every line of a cart, evaluates promotions over the result and renders the
//! outcome as a table.

use std::io;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartSnapshot},
    lookups::{Catalog, PriceList},
    pricing::{LineItemPricer, PricedLine, PricingError},
    promotions::{
        AppliedDiscount, Promotion, PromotionError, Usage, evaluate_promotions, resolve_coupon,
    },
};

/// Errors that can occur when building or rendering a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// A line could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Promotions could not be evaluated.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// The priced lines do not form a valid cart.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Totals overflowed minor units.
    #[error("quote total overflowed")]
    Overflow,

    /// IO error
    #[error("IO error")]
    IO,
}

/// Priced cart with its applicable discounts and totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    lines: Vec<PricedLine>,
    discounts: Vec<AppliedDiscount>,
    rejected_coupons: Vec<String>,
    subtotal: Money<'static, Currency>,
    delivery_fee: Money<'static, Currency>,
    discount_total: Money<'static, Currency>,
    total: Money<'static, Currency>,
    currency: &'static Currency,
}

impl Quote {
    /// Build a quote from priced lines, the snapshot they produced and the discounts
    /// evaluated over it.
    ///
    /// A free-delivery discount waives the delivery fee; every other discount is taken
    /// off the subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Overflow`] when the totals do not fit in minor units.
    pub fn new(
        lines: Vec<PricedLine>,
        snapshot: &CartSnapshot,
        discounts: Vec<AppliedDiscount>,
    ) -> Result<Self, QuoteError> {
        let currency = snapshot.currency;
        let subtotal = snapshot.subtotal().to_minor_units();

        let delivery_fee = if discounts.iter().any(|discount| discount.free_delivery) {
            0
        } else {
            snapshot.delivery_fee.to_minor_units()
        };

        let discount_total = discounts
            .iter()
            .filter(|discount| !discount.free_delivery)
            .try_fold(0_i64, |acc, discount| {
                acc.checked_add(discount.amount.to_minor_units())
            })
            .ok_or(QuoteError::Overflow)?;

        let total = subtotal
            .checked_sub(discount_total)
            .and_then(|amount| amount.checked_add(delivery_fee))
            .ok_or(QuoteError::Overflow)?;

        Ok(Self {
            lines,
            discounts,
            rejected_coupons: Vec::new(),
            subtotal: Money::from_minor(subtotal, currency),
            delivery_fee: Money::from_minor(delivery_fee, currency),
            discount_total: Money::from_minor(discount_total, currency),
            total: Money::from_minor(total, currency),
            currency,
        })
    }

    /// Priced lines, in cart order
    #[must_use]
    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    /// Accepted discounts, in evaluation order
    #[must_use]
    pub fn discounts(&self) -> &[AppliedDiscount] {
        &self.discounts
    }

    /// Entered coupon codes that matched no active, published, in-window coupon
    #[must_use]
    pub fn rejected_coupons(&self) -> &[String] {
        &self.rejected_coupons
    }

    /// Sum of line totals
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Delivery fee charged, zero when waived
    #[must_use]
    pub fn delivery_fee(&self) -> Money<'static, Currency> {
        self.delivery_fee
    }

    /// Sum of discounts taken off the subtotal
    #[must_use]
    pub fn discount_total(&self) -> Money<'static, Currency> {
        self.discount_total
    }

    /// Amount due
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Currency used for all monetary values.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Writes the quote as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a line total overflows or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), QuoteError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Qty", "Unit Price", "Total"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line_label(line),
                line.quantity.to_string(),
                format!("{}", line.unit_price),
                format!("{}", line.line_total()?),
            ]);
        }

        for discount in &self.discounts {
            builder.push_record([
                String::new(),
                discount_label(discount),
                String::new(),
                String::new(),
                format!("-{}", discount.amount),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        if !self.discounts.is_empty() {
            theme.insert_horizontal_line(self.lines.len() + 1, separator);
        }

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..5), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| QuoteError::IO)?;

        let summary = [
            ("Subtotal:", format!("{}", self.subtotal)),
            ("Discounts:", format!("-{}", self.discount_total)),
            ("Delivery:", format!("{}", self.delivery_fee)),
            ("Total:", format!("{}", self.total)),
        ];

        let value_width = summary
            .iter()
            .map(|(_, value)| value.chars().count())
            .max()
            .unwrap_or_default();

        for (label, value) in summary {
            writeln!(out, " {label:>10}  {value:>value_width$}").map_err(|_err| QuoteError::IO)?;
        }

        for code in &self.rejected_coupons {
            writeln!(out, " Coupon {code} was not applied").map_err(|_err| QuoteError::IO)?;
        }

        writeln!(out).map_err(|_err| QuoteError::IO)
    }
}

fn line_label(line: &PricedLine) -> String {
    let snapshot = &line.snapshot;
    let mut label = snapshot.name.display().to_string();

    if !snapshot.variant_name.is_empty() {
        label.push_str(&format!(" ({})", snapshot.variant_name.display()));
    }

    for modifier in &snapshot.modifiers {
        label.push_str("\n  + ");
        label.push_str(modifier.option_name.display());

        if modifier.quantity > 1 {
            label.push_str(&format!(" x{}", modifier.quantity));
        }
    }

    label
}

fn discount_label(discount: &AppliedDiscount) -> String {
    match &discount.code {
        Some(code) => format!("{} [{code}]", discount.name),
        None => discount.name.clone(),
    }
}

/// Builds quotes for carts against one tenant's catalog, price list and promotions.
#[derive(Debug)]
pub struct Quoter<'a, C: ?Sized, P: ?Sized> {
    catalog: &'a C,
    pricer: LineItemPricer<'a, P>,
    promotions: &'a [Promotion],
}

impl<'a, C: Catalog + ?Sized, P: PriceList + ?Sized> Quoter<'a, C, P> {
    /// Create a quoter; `fallback_currency` applies when no external price sets one.
    #[must_use]
    pub fn new(
        catalog: &'a C,
        price_list: &'a P,
        promotions: &'a [Promotion],
        fallback_currency: &'static Currency,
    ) -> Self {
        Self {
            catalog,
            pricer: LineItemPricer::new(price_list, fallback_currency),
            promotions,
        }
    }

    /// Price every line of `cart` and evaluate promotions over the result.
    ///
    /// Coupon codes that resolve to no usable coupon do not fail the quote; they are
    /// reported through [`Quote::rejected_coupons`].
    ///
    /// # Errors
    ///
    /// - [`QuoteError::Pricing`]: the first line that could not be priced.
    /// - [`QuoteError::Cart`]: lines disagree on currency or the subtotal overflows.
    /// - [`QuoteError::Promotion`]: promotion evaluation failed.
    /// - [`QuoteError::Overflow`]: totals overflowed.
    pub fn quote(
        &self,
        cart: &Cart,
        usage: Usage<'_>,
        now: Timestamp,
    ) -> Result<Quote, QuoteError> {
        let lines = cart
            .lines
            .iter()
            .map(|line| self.pricer.price_cart_line(self.catalog, line, now))
            .collect::<Result<Vec<_>, _>>()?;

        let snapshot =
            CartSnapshot::from_priced_lines(cart, &lines, self.pricer.fallback_currency())?;

        let discounts = evaluate_promotions(self.promotions, &snapshot, now, usage)?;

        let mut quote = Quote::new(lines, &snapshot, discounts)?;

        quote.rejected_coupons = cart
            .coupon_codes
            .iter()
            .filter(|code| !code.trim().is_empty())
            .filter(|code| resolve_coupon(self.promotions, code, now).is_err())
            .map(|code| code.trim().to_string())
            .collect();

        Ok(quote)
    }
}
