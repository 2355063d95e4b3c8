//! Typed view of the aggregate relation.

use polars::prelude::{DataFrame, DataType};

use clv_model::columns::{
    AVERAGE_ORDER_VALUE, CLV, COUNTRY, CUSTOMER_AGE_YEARS, CUSTOMER_ID, DATE_OF_BIRTH, EMAIL,
    FIRST_NAME, GENDER, LAST_NAME, ORDER_COUNT, ORDERS_PER_YEAR, PAYMENT_COUNT, TOTAL_AMOUNT_PAID,
    TOTAL_ORDER_VALUE,
};
use clv_model::{CustomerAggregate, Demographics};

use crate::datetime::date_from_epoch_days;
use crate::error::{Result, TransformError};

fn missing(column: &str) -> TransformError {
    TransformError::MissingColumn {
        source_name: "aggregate".to_string(),
        column: column.to_string(),
    }
}

fn text_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = df.column(column).map_err(|_| missing(column))?.str()?;
    Ok(values
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

fn float_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let values = df
        .column(column)
        .map_err(|_| missing(column))?
        .cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

fn int_values(df: &DataFrame, column: &str) -> Result<Vec<i64>> {
    let values = df
        .column(column)
        .map_err(|_| missing(column))?
        .cast(&DataType::Int64)?;
    Ok(values
        .i64()?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Convert the frame returned by [`crate::transform`] into typed rows.
///
/// `customer_id` is read when present (identity grouping) and left `None`
/// otherwise. Row order is preserved.
pub fn aggregate_records(df: &DataFrame) -> Result<Vec<CustomerAggregate>> {
    let customer_ids = match df.column(CUSTOMER_ID) {
        Ok(column) => {
            let ids = column.cast(&DataType::Int64)?;
            ids.i64()?.into_iter().collect()
        }
        Err(_) => vec![None; df.height()],
    };

    let first_names = text_values(df, FIRST_NAME)?;
    let last_names = text_values(df, LAST_NAME)?;
    let emails = text_values(df, EMAIL)?;
    let countries = text_values(df, COUNTRY)?;
    let genders = text_values(df, GENDER)?;

    let birth_days = df
        .column(DATE_OF_BIRTH)
        .map_err(|_| missing(DATE_OF_BIRTH))?
        .cast(&DataType::Int32)?;
    let birth_days = birth_days.i32()?;

    let order_counts = int_values(df, ORDER_COUNT)?;
    let payment_counts = int_values(df, PAYMENT_COUNT)?;
    let paid = float_values(df, TOTAL_AMOUNT_PAID)?;
    let order_values = float_values(df, TOTAL_ORDER_VALUE)?;
    let averages = float_values(df, AVERAGE_ORDER_VALUE)?;
    let per_year = float_values(df, ORDERS_PER_YEAR)?;
    let ages = float_values(df, CUSTOMER_AGE_YEARS)?;
    let clvs = float_values(df, CLV)?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let days = birth_days.get(idx);
        let date_of_birth = days.and_then(date_from_epoch_days).ok_or_else(|| {
            TransformError::InvalidDate {
                row: idx + 1,
                value: days.map(|d| d.to_string()).unwrap_or_default(),
            }
        })?;
        records.push(CustomerAggregate {
            customer_id: customer_ids[idx],
            demographics: Demographics {
                first_name: first_names[idx].clone(),
                last_name: last_names[idx].clone(),
                email: emails[idx].clone(),
                country: countries[idx].clone(),
                gender: genders[idx].clone(),
                date_of_birth,
            },
            order_count: order_counts[idx],
            payment_count: payment_counts[idx],
            total_amount_paid: paid[idx],
            total_order_value: order_values[idx],
            average_order_value: averages[idx],
            orders_per_year: per_year[idx],
            customer_age_years: ages[idx],
            clv: clvs[idx],
        });
    }
    Ok(records)
}
