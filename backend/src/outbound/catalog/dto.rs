//! Wire representation of remote catalog products.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::ports::CatalogProduct;
use crate::domain::product::{Price, ProductName};

/// Product payload as served by the remote catalog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProductDto {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl RemoteProductDto {
    /// Validate the payload into a domain catalog product.
    pub fn into_domain(self) -> Result<CatalogProduct, String> {
        let name = ProductName::new(self.name)
            .map_err(|err| format!("remote product name invalid: {err}"))?;
        let price = Price::new(self.price)
            .map_err(|err| format!("remote product price invalid: {err}"))?;
        Ok(CatalogProduct {
            name,
            description: self.description,
            price,
            category: self.category,
            image_url: self.image_url,
        })
    }
}
