use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use clv_cli::types::RunResult;
use clv_model::{CustomerAggregate, redact_value};

/// Customers listed in the top-CLV table.
const TOP_CUSTOMERS: usize = 10;

pub fn print_summary(result: &RunResult) {
    println!("As of: {}", result.as_of);
    println!("Grouping: {}", result.grouping);
    match &result.load {
        Some(report) => println!(
            "Destination: {} (table {}, {})",
            report.destination, report.table, report.mode
        ),
        None => println!("Destination: dry run, nothing written"),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Rows"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for source in &result.sources {
        table.add_row(vec![
            stage_cell(&format!("extract {}", source.source)),
            Cell::new(source.rows),
            dim_cell(source.path.display()),
        ]);
    }
    table.add_row(vec![
        stage_cell("transform"),
        Cell::new(result.aggregates.len()),
        dim_cell(format!("customer groups by {}", result.grouping)),
    ]);
    match &result.load {
        Some(report) => table.add_row(vec![
            stage_cell("load"),
            Cell::new(report.rows_written).add_attribute(Attribute::Bold),
            Cell::new(if report.rows_deleted > 0 {
                format!("{} replaced", report.rows_deleted)
            } else {
                "committed".to_string()
            })
            .fg(Color::Green),
        ]),
        None => table.add_row(vec![
            stage_cell("load"),
            dim_cell("-"),
            Cell::new("skipped (dry run)").fg(Color::Yellow),
        ]),
    };
    println!("{table}");
    print_top_customers(result);
}

fn print_top_customers(result: &RunResult) {
    if result.aggregates.is_empty() {
        return;
    }
    let mut ranked: Vec<usize> = (0..result.aggregates.len()).collect();
    ranked.sort_by(|&a, &b| {
        result.aggregates[b]
            .clv
            .total_cmp(&result.aggregates[a].clv)
            .then(a.cmp(&b))
    });

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Customer"),
        header_cell("Key"),
        header_cell("Orders"),
        header_cell("Paid"),
        header_cell("Avg order value"),
        header_cell("Age (years)"),
        header_cell("CLV"),
    ]);
    apply_table_style(&mut table);
    for index in 2..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for &idx in ranked.iter().take(TOP_CUSTOMERS) {
        let aggregate = &result.aggregates[idx];
        let row = &result.rows[idx];
        table.add_row(vec![
            Cell::new(customer_label(aggregate)),
            dim_cell(row.customer_id),
            Cell::new(aggregate.order_count),
            Cell::new(format!("{:.2}", aggregate.total_amount_paid)),
            Cell::new(format!("{:.2}", aggregate.average_order_value)),
            Cell::new(format!("{:.1}", aggregate.customer_age_years)),
            Cell::new(format!("{:.2}", aggregate.clv))
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
        ]);
    }
    println!("{table}");
}

/// Customer name as shown on stdout; hidden unless `--log-data` is set.
fn customer_label(aggregate: &CustomerAggregate) -> String {
    redact_value(&aggregate.demographics.full_name()).to_string()
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn stage_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
