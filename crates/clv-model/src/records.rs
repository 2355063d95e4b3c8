//! Typed rows produced by the transform stage and consumed by the loader.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The demographic tuple describing a customer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Demographics {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
}

impl Demographics {
    /// Display name used in summaries.
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

/// One row of the aggregate relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    /// Present only when grouping by customer identity.
    pub customer_id: Option<i64>,
    pub demographics: Demographics,
    /// Distinct orders with at least one payment.
    pub order_count: i64,
    pub payment_count: i64,
    pub total_amount_paid: f64,
    pub total_order_value: f64,
    pub average_order_value: f64,
    pub orders_per_year: f64,
    pub customer_age_years: f64,
    pub clv: f64,
}

/// One row of the destination `customer_ltv` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvRow {
    pub customer_id: i64,
    pub total_orders: i64,
    pub total_amount: f64,
    pub avg_order_value: f64,
    pub ltv: f64,
}
