//! PostgreSQL-backed `ProductRepository` implementation using Diesel.
//!
//! Partial updates are resolved against the stored row first and written
//! back as a full changeset, which keeps the clear-to-NULL semantics of
//! optional columns explicit.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{ProductPatch, ProductPersistenceError, ProductRepository};
use crate::domain::product::{Price, Product, ProductId, ProductName};

use super::models::{NewProductRow, ProductChanges, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::products;

/// Diesel-backed implementation of the `ProductRepository` port.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProductPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ProductPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ProductPersistenceError {
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
            ProductPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => ProductPersistenceError::query("record not found"),
        _ => ProductPersistenceError::query("database error"),
    }
}

/// Convert a stored row to a domain product.
fn row_to_product(row: ProductRow) -> Result<Product, ProductPersistenceError> {
    let name = ProductName::new(row.name)
        .map_err(|err| ProductPersistenceError::query(format!("stored name invalid: {err}")))?;
    let price = Price::new(row.price)
        .map_err(|err| ProductPersistenceError::query(format!("stored price invalid: {err}")))?;
    Ok(Product {
        id: ProductId::from_uuid(row.id),
        name,
        description: row.description,
        price,
        category: row.category,
        image_url: row.image_url,
        is_available: row.is_available,
        created_at: row.created_at,
        modified_at: row.modified_at,
    })
}

/// Apply a patch to the stored product, refreshing `modified_at`.
fn apply_patch(stored: Product, patch: ProductPatch) -> Product {
    Product {
        id: stored.id,
        name: patch.name.unwrap_or(stored.name),
        description: patch.description.unwrap_or(stored.description),
        price: patch.price.unwrap_or(stored.price),
        category: patch.category.unwrap_or(stored.category),
        image_url: patch.image_url.unwrap_or(stored.image_url),
        is_available: patch.is_available.unwrap_or(stored.is_available),
        created_at: stored.created_at,
        modified_at: Utc::now(),
    }
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn list(&self) -> Result<Vec<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProductRow> = products::table
            .order(products::id.asc())
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_product).collect()
    }

    async fn create(&self, product: Product) -> Result<Product, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewProductRow {
            id: *product.id.as_uuid(),
            name: product.name.as_str(),
            description: &product.description,
            price: product.price.amount(),
            category: product.category.as_deref(),
            image_url: product.image_url.as_deref(),
            is_available: product.is_available,
            created_at: product.created_at,
            modified_at: product.modified_at,
        };

        diesel::insert_into(products::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(product)
    }

    async fn find_by_id(
        &self,
        id: &ProductId,
    ) -> Result<Option<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ProductRow> = products::table
            .filter(products::id.eq(id.as_uuid()))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_product).transpose()
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, ProductPersistenceError> {
        let Some(stored) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let updated = apply_patch(stored, patch);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = ProductChanges {
            name: updated.name.as_str(),
            description: &updated.description,
            price: updated.price.amount(),
            category: updated.category.as_deref(),
            image_url: updated.image_url.as_deref(),
            is_available: updated.is_available,
            modified_at: updated.modified_at,
        };

        let affected = diesel::update(products::table.filter(products::id.eq(id.as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if affected == 0 {
            return Ok(None);
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: &ProductId) -> Result<bool, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(products::table.filter(products::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn stored_teapot() -> Product {
        Product::create(
            ProductName::new("Teapot").expect("name"),
            "Stoneware teapot",
            Price::new(Decimal::new(1999, 2)).expect("price"),
            Some("kitchen".into()),
            None,
            true,
        )
    }

    #[rstest]
    fn patch_keeps_unset_fields_and_refreshes_timestamp() {
        let stored = stored_teapot();
        let before = stored.modified_at;
        let patched = apply_patch(
            stored,
            ProductPatch {
                price: Some(Price::new(Decimal::new(1499, 2)).expect("price")),
                ..ProductPatch::default()
            },
        );
        assert_eq!(patched.name.as_str(), "Teapot");
        assert_eq!(patched.price.amount(), Decimal::new(1499, 2));
        assert!(patched.modified_at >= before);
    }

    #[rstest]
    fn patch_clears_optional_fields_explicitly() {
        let patched = apply_patch(
            stored_teapot(),
            ProductPatch {
                category: Some(None),
                ..ProductPatch::default()
            },
        );
        assert_eq!(patched.category, None);
    }

    #[rstest]
    fn negative_stored_price_is_a_query_error() {
        let row = ProductRow {
            id: uuid::Uuid::new_v4(),
            name: "Teapot".into(),
            description: String::new(),
            price: Decimal::new(-1, 2),
            category: None,
            image_url: None,
            is_available: true,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        assert!(matches!(
            row_to_product(row),
            Err(ProductPersistenceError::Query { .. })
        ));
    }
}
