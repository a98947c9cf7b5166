//! Run parameters for one restaurant session.

use crate::error::{Error, Result};

/// Sizes and timings for a customers/cooks run.
///
/// The defaults reproduce the classic lab setup: a 100-slot counter,
/// 90 customers ordering 3 times each, and 10 cooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestaurantConfig {
    /// Maximum number of unfulfilled orders waiting at once.
    pub capacity: usize,
    pub customers: usize,
    pub cooks: usize,
    pub orders_per_customer: usize,
    /// Simulated cooking time per order.
    pub cook_ms: u64,
    /// Base seed for menu picks; each customer offsets it by its id.
    pub seed: Option<u64>,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            customers: 90,
            cooks: 10,
            orders_per_customer: 3,
            cook_ms: 10,
            seed: None,
        }
    }
}

impl RestaurantConfig {
    /// Total orders the whole run will ever place.
    ///
    /// This must be exact: the queue uses it to decide when cooks may go home.
    pub fn expected_total(&self) -> Result<u64> {
        self.customers
            .checked_mul(self.orders_per_customer)
            .map(|total| total as u64)
            .ok_or_else(|| {
                Error::Config(format!(
                    "customers ({}) * orders_per_customer ({}) overflows",
                    self.customers, self.orders_per_customer
                ))
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be > 0".to_string()));
        }
        if self.cooks == 0 {
            return Err(Error::Config("cooks must be > 0".to_string()));
        }
        self.expected_total().map(|_| ())
    }
}
