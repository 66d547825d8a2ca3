//! Stock verification and decrement for inventory-backed line items.

use crate::error::EngineError;
use crate::models::NewLineItem;
use crate::services::metrics::{LOW_STOCK_TOTAL, STOCK_DECREMENTS_TOTAL};
use crate::services::store::DocumentStore;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Applies the one-unit-per-line stock rule during invoice creation.
///
/// Each decrement is conditional at the storage layer. When any line fails,
/// the ledger re-increments everything it already took in the same request,
/// so a rejected invoice leaves stock untouched.
pub struct InventoryLedger {
    store: Arc<dyn DocumentStore>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Take one unit per product-backed line item, in line order. Returns
    /// the products taken from, one entry per decrement, for a later
    /// [`InventoryLedger::release`] if the invoice write fails.
    pub async fn reserve(
        &self,
        owner_id: Uuid,
        items: &[NewLineItem],
    ) -> Result<Vec<Uuid>, EngineError> {
        let mut taken: Vec<Uuid> = Vec::new();

        for item in items {
            let Some(product_id) = item.product_id else {
                continue;
            };

            let product = match self.store.product(owner_id, product_id).await {
                Ok(Some(product)) => product,
                // Dangling product reference: the line is kept, stock is
                // untouched.
                Ok(None) => continue,
                Err(e) => {
                    self.release(&taken).await;
                    return Err(e.into());
                }
            };

            match self.store.decrement_stock(product_id).await {
                Ok(Some(remaining)) => {
                    STOCK_DECREMENTS_TOTAL
                        .with_label_values(&["committed"])
                        .inc();
                    if remaining <= product.low_stock_threshold {
                        LOW_STOCK_TOTAL.inc();
                        warn!(
                            product_id = %product_id,
                            product = %product.name,
                            remaining,
                            "Product at or below low-stock threshold"
                        );
                    }
                    taken.push(product_id);
                }
                Ok(None) => {
                    STOCK_DECREMENTS_TOTAL
                        .with_label_values(&["rejected"])
                        .inc();
                    self.release(&taken).await;
                    return Err(EngineError::StockExhausted {
                        product_id,
                        name: product.name,
                    });
                }
                Err(e) => {
                    self.release(&taken).await;
                    return Err(e.into());
                }
            }
        }

        Ok(taken)
    }

    /// Re-increment previously taken units, one per entry.
    pub async fn release(&self, taken: &[Uuid]) {
        for product_id in taken {
            match self.store.restore_stock(*product_id, 1).await {
                Ok(()) => {
                    STOCK_DECREMENTS_TOTAL
                        .with_label_values(&["released"])
                        .inc();
                }
                Err(e) => {
                    error!(
                        product_id = %product_id,
                        error = %e,
                        "Failed to return reserved stock"
                    );
                }
            }
        }
    }
}
