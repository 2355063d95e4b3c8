//! Behavioral tests for the CLV transform.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use clv_model::{GroupingKey, TransformOptions};
use clv_transform::{TransformError, aggregate_records, parse_birth_date, to_ltv_rows, transform};

struct Customer<'a> {
    id: i64,
    first: &'a str,
    email: &'a str,
    dob: &'a str,
}

fn customers(rows: &[Customer<'_>]) -> DataFrame {
    df!(
        "customer_id" => rows.iter().map(|c| c.id).collect::<Vec<_>>(),
        "first_name" => rows.iter().map(|c| c.first).collect::<Vec<_>>(),
        "last_name" => rows.iter().map(|_| "Doe").collect::<Vec<_>>(),
        "email" => rows.iter().map(|c| c.email).collect::<Vec<_>>(),
        "country" => rows.iter().map(|_| "RW").collect::<Vec<_>>(),
        "gender" => rows.iter().map(|_| "F").collect::<Vec<_>>(),
        "date_of_birth" => rows.iter().map(|c| c.dob).collect::<Vec<_>>(),
    )
    .unwrap()
}

fn orders(rows: &[(i64, i64, f64)]) -> DataFrame {
    df!(
        "order_id" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "customer_id" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "price" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
    )
    .unwrap()
}

fn payments(rows: &[(i64, i64, f64)]) -> DataFrame {
    df!(
        "order_id" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "customer_id" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "amount" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
    )
    .unwrap()
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn ada() -> Customer<'static> {
    Customer {
        id: 1,
        first: "Ada",
        email: "ada@example.com",
        dob: "2000-01-01",
    }
}

fn by_identity() -> TransformOptions {
    TransformOptions::new().with_grouping(GroupingKey::CustomerId)
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[test]
fn single_customer_scenario_matches_formula() {
    let out = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 1, 80.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap();

    let records = aggregate_records(&out).unwrap();
    assert_eq!(records.len(), 1);
    let row = &records[0];

    let age = 8766.0 / 365.0;
    assert_eq!(row.total_amount_paid, 80.0);
    assert_eq!(row.total_order_value, 100.0);
    assert_eq!(row.average_order_value, 1.25);
    assert_eq!(row.customer_age_years, age);
    assert_eq!(row.orders_per_year, 80.0 / age);
    assert_eq!(row.clv, 1.25 * (80.0 / age) * age);
    assert!((row.clv - 100.0).abs() < 1e-9);
    assert_eq!(row.order_count, 1);
    assert_eq!(row.payment_count, 1);
    assert_eq!(row.customer_id, None);
    assert_eq!(
        row.demographics.date_of_birth,
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
    );
}

#[test]
fn output_has_no_join_keys() {
    let out = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 1, 80.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap();

    let columns = names(&out);
    assert!(!columns.iter().any(|c| c == "customer_id"));
    assert!(!columns.iter().any(|c| c == "order_id"));
    assert_eq!(
        columns,
        vec![
            "first_name",
            "last_name",
            "email",
            "country",
            "gender",
            "date_of_birth",
            "order_count",
            "payment_count",
            "total_amount_paid",
            "total_order_value",
            "average_order_value",
            "orders_per_year",
            "customer_age_years",
            "clv",
        ]
    );
}

#[test]
fn customers_without_orders_or_payments_are_excluded() {
    let people = [
        ada(),
        Customer {
            id: 2,
            first: "Bob",
            email: "bob@example.com",
            dob: "1990-05-05",
        },
        Customer {
            id: 3,
            first: "Cy",
            email: "cy@example.com",
            dob: "1985-02-02",
        },
    ];
    // Bob has an unpaid order, Cy has no orders at all.
    let out = transform(
        &customers(&people),
        &orders(&[(10, 1, 100.0), (11, 2, 50.0)]),
        &payments(&[(10, 1, 80.0)]),
        at(2024, 1, 1),
        &by_identity(),
    )
    .unwrap();

    let ids: Vec<Option<i64>> = out.column("customer_id").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(ids, vec![Some(1)]);
}

#[test]
fn payment_for_another_customer_does_not_match_order() {
    let out = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 2, 80.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap();

    assert_eq!(out.height(), 0);
}

#[test]
fn empty_orders_yield_empty_output() {
    let out = transform(
        &customers(&[ada()]),
        &orders(&[]),
        &payments(&[(10, 1, 80.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap();

    assert_eq!(out.height(), 0);
    assert!(aggregate_records(&out).unwrap().is_empty());
}

#[test]
fn shared_demographics_merge_into_one_row() {
    let twin = Customer { id: 2, ..ada() };
    let input = customers(&[ada(), twin]);
    let order_rows = orders(&[(10, 1, 100.0), (11, 2, 60.0)]);
    let payment_rows = payments(&[(10, 1, 80.0), (11, 2, 60.0)]);

    let merged = transform(
        &input,
        &order_rows,
        &payment_rows,
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap();
    let merged = aggregate_records(&merged).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].total_amount_paid, 140.0);
    assert_eq!(merged[0].total_order_value, 160.0);
    assert_eq!(merged[0].order_count, 2);

    let separate = transform(&input, &order_rows, &payment_rows, at(2024, 1, 1), &by_identity()).unwrap();
    let separate = aggregate_records(&separate).unwrap();
    assert_eq!(separate.len(), 2);
    assert_eq!(separate[0].customer_id, Some(1));
    assert_eq!(separate[1].customer_id, Some(2));
    assert_eq!(separate[1].total_order_value, 60.0);
}

#[test]
fn each_instalment_adds_the_order_price() {
    let out = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 1, 30.0), (10, 1, 50.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap();

    let records = aggregate_records(&out).unwrap();
    assert_eq!(records[0].total_amount_paid, 80.0);
    assert_eq!(records[0].total_order_value, 200.0);
    assert_eq!(records[0].average_order_value, 2.5);
    assert_eq!(records[0].order_count, 1);
    assert_eq!(records[0].payment_count, 2);
}

#[test]
fn collapsed_instalments_count_order_price_once() {
    let options = TransformOptions::new().with_collapsed_instalments(true);
    let out = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 1, 30.0), (10, 1, 50.0)]),
        at(2024, 1, 1),
        &options,
    )
    .unwrap();

    let records = aggregate_records(&out).unwrap();
    assert_eq!(records[0].total_amount_paid, 80.0);
    assert_eq!(records[0].total_order_value, 100.0);
    assert_eq!(records[0].average_order_value, 1.25);
    assert_eq!(records[0].order_count, 1);
    assert_eq!(records[0].payment_count, 2);
}

#[test]
fn repeated_runs_with_same_clock_are_identical() {
    let people = [
        ada(),
        Customer {
            id: 2,
            first: "Bob",
            email: "bob@example.com",
            dob: "05/05/1990",
        },
    ];
    let run = || {
        transform(
            &customers(&people),
            &orders(&[(11, 2, 40.0), (10, 1, 100.0), (12, 1, 20.0)]),
            &payments(&[(12, 1, 20.0), (10, 1, 80.0), (11, 2, 40.0)]),
            at(2024, 6, 30),
            &TransformOptions::default(),
        )
        .unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.equals(&second));
    assert_eq!(
        to_ltv_rows(&aggregate_records(&first).unwrap()),
        to_ltv_rows(&aggregate_records(&second).unwrap())
    );
}

#[test]
fn unparseable_birth_date_fails_the_run() {
    let bad = Customer {
        dob: "not a date",
        ..ada()
    };
    let err = transform(
        &customers(&[bad]),
        &orders(&[]),
        &payments(&[]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap_err();

    match err {
        TransformError::InvalidDate { row, value } => {
            assert_eq!(row, 1);
            assert_eq!(value, "not a date");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_paid_amount_is_an_error() {
    let err = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 1, 0.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap_err();

    assert!(
        matches!(err, TransformError::ZeroAmountPaid { ref customer } if customer == "customer group 1 <[REDACTED]>"),
        "got: {err}"
    );
}

#[test]
fn birth_on_processing_day_is_an_error() {
    let err = transform(
        &customers(&[ada()]),
        &orders(&[(10, 1, 100.0)]),
        &payments(&[(10, 1, 80.0)]),
        at(2000, 1, 1),
        &by_identity(),
    )
    .unwrap_err();

    assert!(
        matches!(err, TransformError::ZeroCustomerAge { ref customer } if customer == "customer 1"),
        "got: {err}"
    );
}

#[test]
fn missing_price_column_is_reported() {
    let orders = df!(
        "order_id" => [10i64],
        "customer_id" => [1i64],
    )
    .unwrap();

    let err = transform(
        &customers(&[ada()]),
        &orders,
        &payments(&[(10, 1, 80.0)]),
        at(2024, 1, 1),
        &TransformOptions::default(),
    )
    .unwrap_err();

    assert!(
        matches!(err, TransformError::MissingColumn { ref column, .. } if column == "price"),
        "got: {err}"
    );
}

#[test]
fn parses_accepted_birth_date_forms() {
    let expected = NaiveDate::from_ymd_opt(2000, 1, 31);
    for value in [
        "2000-01-31",
        "2000/01/31",
        "20000131",
        "01/31/2000",
        "31-Jan-2000",
        "Jan 31, 2000",
        "2000-01-31T08:15:00",
        "2000-01-31 08:15:00.250",
        "2000-01-31T08:15:00+02:00",
        "  2000-01-31  ",
    ] {
        assert_eq!(parse_birth_date(value), expected, "value: {value}");
    }
    assert_eq!(parse_birth_date(""), None);
    assert_eq!(parse_birth_date("2000-02-30"), None);
}
