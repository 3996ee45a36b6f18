//! Cart aggregate: an ordered mapping from product id to quantity and price.
//!
//! The cart itself is a value type; persistence adapters load and store
//! whole snapshots. Mutations follow the original contract: adding the same
//! product accumulates quantity unless an override is requested, removing
//! an absent product is a no-op, and clearing discards every line.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::{Price, ProductId};

/// Validation errors raised by cart value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartValidationError {
    ZeroQuantity,
}

impl fmt::Display for CartValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroQuantity => write!(f, "quantity must be a positive integer"),
        }
    }
}

impl std::error::Error for CartValidationError {}

/// Positive item quantity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Validate and construct a [`Quantity`].
    pub fn new(value: u32) -> Result<Self, CartValidationError> {
        if value == 0 {
            return Err(CartValidationError::ZeroQuantity);
        }
        Ok(Self(value))
    }

    /// A quantity of one.
    pub fn one() -> Self {
        Self(1)
    }

    /// Access the raw count.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Saturating addition; carts never wrap.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = CartValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One cart line: how many units at which unit price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub quantity: Quantity,
    pub unit_price: Price,
}

impl CartLine {
    /// Exact line total (`unit_price * quantity`).
    pub fn total_price(&self) -> Decimal {
        self.unit_price.amount() * Decimal::from(self.quantity.get())
    }
}

/// The cart mapping. Ordered by product id so listings are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<ProductId, CartLine>,
}

impl Cart {
    /// An empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product or update its quantity.
    ///
    /// Without `override_quantity` a repeated add accumulates; with it the
    /// stored quantity is replaced. The unit price always reflects the
    /// latest add so catalog price changes propagate on the next mutation.
    pub fn add(
        &mut self,
        product_id: ProductId,
        unit_price: Price,
        quantity: Quantity,
        override_quantity: bool,
    ) {
        let quantity = match (override_quantity, self.lines.get(&product_id)) {
            (false, Some(existing)) => existing.quantity.saturating_add(quantity),
            _ => quantity,
        };
        self.lines.insert(
            product_id,
            CartLine {
                quantity,
                unit_price,
            },
        );
    }

    /// Remove a product from the cart. Absent ids are a no-op.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.lines.remove(product_id);
    }

    /// Discard every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whether the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines
            .values()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Exact total price across all lines.
    pub fn total_price(&self) -> Decimal {
        self.lines.values().map(CartLine::total_price).sum()
    }

    /// Look up one line.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.get(product_id)
    }

    /// Iterate lines in product-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, &CartLine)> {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).expect("non-negative price")
    }

    fn qty(value: u32) -> Quantity {
        Quantity::new(value).expect("positive quantity")
    }

    #[test]
    fn quantity_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(CartValidationError::ZeroQuantity));
    }

    #[test]
    fn adding_twice_accumulates_quantity() {
        let id = ProductId::random();
        let mut cart = Cart::new();
        cart.add(id, price(1050), qty(2), false);
        cart.add(id, price(1050), qty(3), false);
        assert_eq!(cart.line(&id).map(|l| l.quantity.get()), Some(5));
    }

    #[test]
    fn override_replaces_quantity() {
        let id = ProductId::random();
        let mut cart = Cart::new();
        cart.add(id, price(1050), qty(4), false);
        cart.add(id, price(1050), qty(1), true);
        assert_eq!(cart.line(&id).map(|l| l.quantity.get()), Some(1));
    }

    #[test]
    fn removing_absent_product_is_noop() {
        let mut cart = Cart::new();
        cart.add(ProductId::random(), price(100), qty(1), false);
        let absent = ProductId::random();
        cart.remove(&absent);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn clear_empties_the_mapping() {
        let mut cart = Cart::new();
        cart.add(ProductId::random(), price(100), qty(2), false);
        cart.add(ProductId::random(), price(250), qty(1), false);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[rstest]
    #[case(&[(1050, 2), (399, 3)], Decimal::new(3297, 2))]
    #[case(&[(1, 1)], Decimal::new(1, 2))]
    #[case(&[], Decimal::ZERO)]
    fn total_price_is_sum_of_line_totals(
        #[case] lines: &[(i64, u32)],
        #[case] expected: Decimal,
    ) {
        let mut cart = Cart::new();
        for (cents, count) in lines {
            cart.add(ProductId::random(), price(*cents), qty(*count), false);
        }
        assert_eq!(cart.total_price(), expected);
    }

    #[test]
    fn item_count_sums_quantities() {
        let mut cart = Cart::new();
        cart.add(ProductId::random(), price(100), qty(2), false);
        cart.add(ProductId::random(), price(200), qty(5), false);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn latest_add_refreshes_unit_price() {
        let id = ProductId::random();
        let mut cart = Cart::new();
        cart.add(id, price(1000), qty(1), false);
        cart.add(id, price(900), qty(1), false);
        assert_eq!(cart.line(&id).map(|l| l.unit_price), Some(price(900)));
        assert_eq!(cart.total_price(), Decimal::new(1800, 2));
    }
}
