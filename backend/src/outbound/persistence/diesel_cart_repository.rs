//! PostgreSQL-backed `CartRepository` implementation using Diesel.
//!
//! One `carts` row per user, created lazily on first save. Saving replaces
//! the item rows wholesale; the cart aggregate is small enough that a full
//! rewrite is simpler than diffing lines.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::cart::{Cart, Quantity};
use crate::domain::ports::{CartPersistenceError, CartRepository};
use crate::domain::product::{Price, ProductId};
use crate::domain::user::UserId;

use super::models::{CartItemRow, NewCartItemRow, NewCartRow};
use super::pool::{DbPool, PoolError};
use super::schema::{cart_items, carts};

/// Diesel-backed implementation of the `CartRepository` port.
#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CartPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CartPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CartPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CartPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => CartPersistenceError::query("record not found"),
        _ => CartPersistenceError::query("database error"),
    }
}

/// Rebuild the cart aggregate from its item rows.
fn rows_to_cart(rows: Vec<CartItemRow>) -> Result<Cart, CartPersistenceError> {
    let mut cart = Cart::new();
    for row in rows {
        let quantity = u32::try_from(row.quantity)
            .ok()
            .and_then(|raw| Quantity::new(raw).ok())
            .ok_or_else(|| {
                CartPersistenceError::query(format!(
                    "stored quantity invalid: {}",
                    row.quantity
                ))
            })?;
        let price = Price::new(row.unit_price).map_err(|err| {
            CartPersistenceError::query(format!("stored unit price invalid: {err}"))
        })?;
        cart.add(ProductId::from_uuid(row.product_id), price, quantity, true);
    }
    Ok(cart)
}

fn line_to_row(cart_id: Uuid, product_id: &ProductId, line: &crate::domain::cart::CartLine) -> NewCartItemRow {
    NewCartItemRow {
        id: Uuid::new_v4(),
        cart_id,
        product_id: *product_id.as_uuid(),
        // Quantities are u32 in the domain; i32::MAX units is beyond any
        // realistic cart, so saturate rather than fail.
        quantity: i32::try_from(line.quantity.get()).unwrap_or(i32::MAX),
        unit_price: line.unit_price.amount(),
    }
}

#[async_trait]
impl CartRepository for DieselCartRepository {
    async fn fetch(&self, user_id: &UserId) -> Result<Cart, CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let cart_id: Option<Uuid> = carts::table
            .filter(carts::user_id.eq(user_id.as_uuid()))
            .select(carts::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(cart_id) = cart_id else {
            return Ok(Cart::new());
        };

        let rows: Vec<CartItemRow> = cart_items::table
            .filter(cart_items::cart_id.eq(cart_id))
            .order(cart_items::product_id.asc())
            .select(CartItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_cart(rows)
    }

    async fn replace(&self, user_id: &UserId, cart: &Cart) -> Result<(), CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let existing: Option<Uuid> = carts::table
            .filter(carts::user_id.eq(user_id.as_uuid()))
            .select(carts::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let cart_id = match existing {
            Some(id) => id,
            None => {
                let row = NewCartRow {
                    id: Uuid::new_v4(),
                    user_id: *user_id.as_uuid(),
                };
                diesel::insert_into(carts::table)
                    .values(&row)
                    .execute(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                row.id
            }
        };

        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<NewCartItemRow> = cart
            .iter()
            .map(|(product_id, line)| line_to_row(cart_id, product_id, line))
            .collect();
        if !rows.is_empty() {
            diesel::insert_into(cart_items::table)
                .values(&rows)
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        }

        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let cart_id: Option<Uuid> = carts::table
            .filter(carts::user_id.eq(user_id.as_uuid()))
            .select(carts::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(cart_id) = cart_id else {
            return Ok(());
        };

        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        diesel::delete(carts::table.filter(carts::id.eq(cart_id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    fn rows_rebuild_the_cart_in_product_order() {
        let cart_id = Uuid::new_v4();
        let rows = vec![
            CartItemRow {
                id: Uuid::new_v4(),
                cart_id,
                product_id: Uuid::new_v4(),
                quantity: 2,
                unit_price: Decimal::new(1050, 2),
            },
            CartItemRow {
                id: Uuid::new_v4(),
                cart_id,
                product_id: Uuid::new_v4(),
                quantity: 3,
                unit_price: Decimal::new(399, 2),
            },
        ];
        let cart = rows_to_cart(rows).expect("cart");
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total_price(), Decimal::new(3297, 2));
    }

    #[rstest]
    #[case(0)]
    #[case(-4)]
    fn non_positive_stored_quantity_is_a_query_error(#[case] quantity: i32) {
        let rows = vec![CartItemRow {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: Decimal::ONE,
        }];
        assert!(matches!(
            rows_to_cart(rows),
            Err(CartPersistenceError::Query { .. })
        ));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, CartPersistenceError::Connection { .. }));
    }
}
