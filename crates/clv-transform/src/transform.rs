//! Join, aggregate and derive CLV metrics.

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, info, info_span};

use clv_model::columns::{
    AMOUNT, AVERAGE_ORDER_VALUE, CLV, CUSTOMER_AGE_YEARS, CUSTOMER_ID, DATE_OF_BIRTH,
    DEMOGRAPHIC_COLUMNS, EMAIL, METRIC_COLUMNS, ORDER_COUNT, ORDER_ID, ORDERS_PER_YEAR,
    PAYMENT_COUNT, PRICE, TOTAL_AMOUNT_PAID, TOTAL_ORDER_VALUE,
};
use clv_model::{GroupingKey, TransformOptions, redact_value};

use crate::datetime::{days_since_epoch, normalize_birth_dates};
use crate::error::{Result, TransformError};

/// Divisor turning a day count into years.
pub const DAYS_PER_YEAR: f64 = 365.0;

const PAYMENT_AMOUNT: &str = "payment_amount";
const PAYMENT_ROWS: &str = "payment_rows";
const CUSTOMER_AGE_DAYS: &str = "customer_age_days";

fn require_columns(df: &DataFrame, source_name: &str, columns: &[&str]) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(TransformError::MissingColumn {
                source_name: source_name.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

fn customer_frame(customers: &DataFrame) -> LazyFrame {
    let mut exprs = vec![col(CUSTOMER_ID).cast(DataType::Int64)];
    exprs.extend(
        DEMOGRAPHIC_COLUMNS
            .iter()
            .filter(|name| **name != DATE_OF_BIRTH)
            .map(|name| col(*name).cast(DataType::String)),
    );
    exprs.push(col(DATE_OF_BIRTH));
    customers.clone().lazy().select(exprs)
}

fn order_frame(orders: &DataFrame) -> LazyFrame {
    orders.clone().lazy().select([
        col(ORDER_ID).cast(DataType::Int64),
        col(CUSTOMER_ID).cast(DataType::Int64),
        col(PRICE).cast(DataType::Float64),
    ])
}

/// Payment rows keyed by `(order_id, customer_id)`.
///
/// Each payment stays its own row unless `collapse` is set, in which case
/// instalments of the same order are summed into one row first.
fn payment_frame(payments: &DataFrame, collapse: bool) -> LazyFrame {
    let rows = payments
        .clone()
        .lazy()
        .select([
            col(ORDER_ID).cast(DataType::Int64),
            col(CUSTOMER_ID).cast(DataType::Int64),
            col(AMOUNT).cast(DataType::Float64).alias(PAYMENT_AMOUNT),
        ])
        .with_column(lit(1i64).alias(PAYMENT_ROWS));
    if !collapse {
        return rows;
    }
    rows.group_by([col(ORDER_ID), col(CUSTOMER_ID)]).agg([
        col(PAYMENT_AMOUNT).sum(),
        col(PAYMENT_ROWS).sum(),
    ])
}

fn aggregations(grouping: GroupingKey) -> Vec<Expr> {
    let mut aggs = Vec::with_capacity(DEMOGRAPHIC_COLUMNS.len() + 4);
    if grouping == GroupingKey::CustomerId {
        aggs.extend(DEMOGRAPHIC_COLUMNS.iter().map(|name| col(*name).first()));
    }
    aggs.extend([
        col(ORDER_ID).n_unique().cast(DataType::Int64).alias(ORDER_COUNT),
        col(PAYMENT_ROWS).sum().alias(PAYMENT_COUNT),
        col(PAYMENT_AMOUNT).sum().alias(TOTAL_AMOUNT_PAID),
        col(PRICE).sum().alias(TOTAL_ORDER_VALUE),
    ]);
    aggs
}

/// Identity of a group for error messages. Emails pass the `--log-data` gate.
fn describe_group(df: &DataFrame, grouping: GroupingKey, idx: usize) -> Result<String> {
    Ok(match grouping {
        GroupingKey::CustomerId => {
            let id = df.column(CUSTOMER_ID)?.i64()?.get(idx);
            format!("customer {}", id.unwrap_or_default())
        }
        GroupingKey::Demographic => {
            let email = df.column(EMAIL)?.str()?.get(idx).unwrap_or_default();
            format!("customer group {} <{}>", idx + 1, redact_value(email))
        }
    })
}

struct DerivedMetrics {
    average_order_value: Vec<f64>,
    orders_per_year: Vec<f64>,
    customer_age_years: Vec<f64>,
    clv: Vec<f64>,
}

fn derive_metrics(grouped: &DataFrame, grouping: GroupingKey) -> Result<DerivedMetrics> {
    let paid = grouped.column(TOTAL_AMOUNT_PAID)?.f64()?;
    let order_value = grouped.column(TOTAL_ORDER_VALUE)?.f64()?;
    let age_days = grouped.column(CUSTOMER_AGE_DAYS)?.cast(&DataType::Int64)?;
    let age_days = age_days.i64()?;

    let height = grouped.height();
    let mut metrics = DerivedMetrics {
        average_order_value: Vec::with_capacity(height),
        orders_per_year: Vec::with_capacity(height),
        customer_age_years: Vec::with_capacity(height),
        clv: Vec::with_capacity(height),
    };

    for idx in 0..height {
        let total_paid = paid.get(idx).unwrap_or_default();
        let total_value = order_value.get(idx).unwrap_or_default();
        let days = age_days.get(idx).unwrap_or_default();

        if total_paid == 0.0 {
            return Err(TransformError::ZeroAmountPaid {
                customer: describe_group(grouped, grouping, idx)?,
            });
        }
        if days == 0 {
            return Err(TransformError::ZeroCustomerAge {
                customer: describe_group(grouped, grouping, idx)?,
            });
        }

        let average_order_value = total_value / total_paid;
        let customer_age_years = days as f64 / DAYS_PER_YEAR;
        let orders_per_year = total_paid / customer_age_years;
        metrics.average_order_value.push(average_order_value);
        metrics.customer_age_years.push(customer_age_years);
        metrics.orders_per_year.push(orders_per_year);
        metrics
            .clv
            .push(average_order_value * orders_per_year * customer_age_years);
    }

    Ok(metrics)
}

fn output_columns(grouping: GroupingKey) -> Vec<&'static str> {
    let mut names = Vec::with_capacity(1 + DEMOGRAPHIC_COLUMNS.len() + METRIC_COLUMNS.len());
    if grouping == GroupingKey::CustomerId {
        names.push(CUSTOMER_ID);
    }
    names.extend(DEMOGRAPHIC_COLUMNS);
    names.extend(METRIC_COLUMNS);
    names
}

/// Compute one CLV aggregate per customer group.
///
/// Customers are inner-joined to orders on `customer_id`, then to payments
/// on `(order_id, customer_id)`, giving one row per (customer, order,
/// payment). Customers without orders and orders without payments therefore
/// never reach the output. `price` is summed over those rows, so an order
/// paid in two instalments counts twice towards `total_order_value` unless
/// `options.collapse_instalments` is set.
///
/// The result is grouped by `options.grouping` and sorted by that key. It
/// carries the demographic fields, the metric columns and, only when grouped
/// by identity, `customer_id`. `order_id` never appears.
///
/// `now` is the processing instant used for customer age; the function does
/// not read the clock.
///
/// # Errors
///
/// - [`TransformError::InvalidDate`] when a birth date cannot be parsed
/// - [`TransformError::ZeroAmountPaid`] / [`TransformError::ZeroCustomerAge`]
///   when a derived ratio would divide by zero
/// - [`TransformError::MissingColumn`] when an input lacks a required column
pub fn transform(
    customers: &DataFrame,
    orders: &DataFrame,
    payments: &DataFrame,
    now: NaiveDateTime,
    options: &TransformOptions,
) -> Result<DataFrame> {
    let span = info_span!(
        "transform",
        grouping = %options.grouping,
        collapse_instalments = options.collapse_instalments
    );
    let _guard = span.enter();

    let mut customer_columns = vec![CUSTOMER_ID];
    customer_columns.extend(DEMOGRAPHIC_COLUMNS);
    require_columns(customers, "customers", &customer_columns)?;
    require_columns(orders, "orders", &[ORDER_ID, CUSTOMER_ID, PRICE])?;
    require_columns(payments, "payments", &[ORDER_ID, CUSTOMER_ID, AMOUNT])?;

    let customers = normalize_birth_dates(customers)?;
    let today = days_since_epoch(now.date());
    let grouping = options.grouping;

    let key: Vec<Expr> = grouping.key_columns().iter().map(|name| col(*name)).collect();
    let grouped = customer_frame(&customers)
        .join(
            order_frame(orders),
            [col(CUSTOMER_ID)],
            [col(CUSTOMER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            payment_frame(payments, options.collapse_instalments),
            [col(ORDER_ID), col(CUSTOMER_ID)],
            [col(ORDER_ID), col(CUSTOMER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .group_by(key.clone())
        .agg(aggregations(grouping))
        .with_column(
            (lit(today) - col(DATE_OF_BIRTH).cast(DataType::Int32)).alias(CUSTOMER_AGE_DAYS),
        )
        .sort_by_exprs(key, SortMultipleOptions::default().with_maintain_order(true))
        .collect()?;

    debug!(
        customers = customers.height(),
        orders = orders.height(),
        payments = payments.height(),
        groups = grouped.height(),
        "joined and grouped sources"
    );

    let metrics = derive_metrics(&grouped, grouping)?;
    let mut out = grouped;
    out.with_column(Series::new(
        AVERAGE_ORDER_VALUE.into(),
        metrics.average_order_value,
    ))?;
    out.with_column(Series::new(ORDERS_PER_YEAR.into(), metrics.orders_per_year))?;
    out.with_column(Series::new(
        CUSTOMER_AGE_YEARS.into(),
        metrics.customer_age_years,
    ))?;
    out.with_column(Series::new(CLV.into(), metrics.clv))?;

    let out = out.select(output_columns(grouping))?;
    info!(rows = out.height(), "transform complete");
    Ok(out)
}
