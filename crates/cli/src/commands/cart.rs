//! Cart commands.

use std::fmt::Write as _;

use basket_cart::{Cart, CartError};
use basket_core::{LineItem, Price, Sku};
use clap::Args;

use super::CommandError;

/// Arguments for `basket add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Product variant identifier
    #[arg(short, long)]
    pub sku: String,

    /// Number of units
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub quantity: u32,

    /// Unit price in currency units, e.g. 19.99
    #[arg(short, long)]
    pub price: String,

    /// Display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Product page key
    #[arg(long)]
    pub url_key: Option<String>,

    /// Note attached to the line
    #[arg(long)]
    pub note: Option<String>,

    /// Pass-through field as key=value (repeatable)
    #[arg(long = "extra", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,
}

impl AddArgs {
    fn into_line_item(self) -> Result<LineItem, CommandError> {
        let mut item = LineItem::new(Sku::parse(&self.sku)?, self.quantity, Price::parse(&self.price)?);
        item.name = self.name;
        item.image = self.image;
        item.url_key = self.url_key;
        item.note = self.note;

        for pair in self.extra {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(CommandError::InvalidExtra(pair));
            };
            if key.is_empty() {
                return Err(CommandError::InvalidExtra(pair));
            }
            item = item.with_extra(key, value);
        }

        Ok(item)
    }
}

/// Print the cart summary, or its payload with `json`.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn show(cart: &Cart, json: bool) -> Result<String, CommandError> {
    if json {
        return Ok(cart.to_json()?);
    }
    Ok(summary(cart))
}

/// Add a line.
///
/// # Errors
///
/// Returns an error if the sku, price, or an extra field is invalid.
pub fn add(cart: &Cart, args: AddArgs) -> Result<String, CommandError> {
    cart.add_item(args.into_line_item()?);
    Ok(summary(cart))
}

/// Set the quantity of a line. A quantity of zero removes the line.
///
/// # Errors
///
/// Returns an error if the sku is not in the cart.
pub fn update(cart: &Cart, sku: &str, quantity: u32) -> Result<String, CommandError> {
    if quantity == 0 {
        if cart.item(sku).is_none() {
            return Err(CartError::ItemNotFound(sku.to_string()).into());
        }
        cart.remove_item(sku);
        return Ok(summary(cart));
    }

    cart.update_item(sku, quantity)?;
    Ok(summary(cart))
}

/// Remove a line.
///
/// # Errors
///
/// Never fails; removing a sku that is not in the cart is allowed.
pub fn remove(cart: &Cart, sku: &str) -> Result<String, CommandError> {
    if cart.remove_item(sku).is_none() {
        tracing::warn!(sku, "Sku was not in the cart");
    }
    Ok(summary(cart))
}

/// Remove every line.
///
/// # Errors
///
/// Never fails.
pub fn clear(cart: &Cart) -> Result<String, CommandError> {
    cart.clear();
    Ok(summary(cart))
}

/// Render lines and totals.
fn summary(cart: &Cart) -> String {
    let items = cart.items();
    if items.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for item in &items {
        let label = item.name.as_deref().unwrap_or_else(|| item.sku.as_str());
        let _ = writeln!(
            out,
            "{:<24} {:>4} x {:>10} = {:>10}",
            label,
            item.quantity,
            item.price.to_string(),
            item.line_total().to_string()
        );
    }

    let _ = writeln!(out, "Items:    {}", cart.item_count());
    let _ = writeln!(out, "Subtotal: {}", cart.subtotal());
    let _ = writeln!(out, "Shipping: {}", cart.shipping());
    let _ = write!(out, "Total:    {}", cart.total());
    out
}
