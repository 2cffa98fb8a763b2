//! Instrument code → vendor routing.

use super::products::ProductTable;
use crate::domain::{Instrument, Vendor};

/// Routes product-table codes to the primary vendor and everything else to
/// the secondary vendor. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    products: ProductTable,
}

impl Resolver {
    pub fn new(products: ProductTable) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &ProductTable {
        &self.products
    }

    pub fn resolve(&self, code: &str) -> Instrument {
        let code = code.trim();
        match self.products.dataset(code) {
            Some(dataset) => Instrument {
                code: code.to_string(),
                vendor: Vendor::Quandl,
                dataset: Some(dataset.to_string()),
            },
            None => Instrument {
                code: code.to_string(),
                vendor: Vendor::Yahoo,
                dataset: None,
            },
        }
    }
}
