use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use clinrec_cli::pipeline::HydrateResult;

pub fn print_summary(result: &HydrateResult) {
    println!("Record type: {}", result.record_type);
    println!("Rows: {}", result.rows.display());

    let report = &result.report;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Outcome"),
        header_cell("Records"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Kept").fg(Color::Green),
        count_cell(report.kept.len(), Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Discarded"),
        count_cell(report.discarded.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Failed").fg(Color::Red),
        count_cell(report.failed.len(), Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Skipped rows").fg(Color::DarkGrey),
        count_cell(result.row_errors.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.total()).add_attribute(Attribute::Bold),
    ]);
    eprintln!("{table}");
    print_issue_table(result);
}

fn print_issue_table(result: &HydrateResult) {
    let mut rows: Vec<(String, &str, String)> = Vec::new();
    for failure in &result.report.failed {
        rows.push((failure.record_id.clone(), "FAILED", failure.error.to_string()));
    }
    for error in &result.row_errors {
        rows.push((format!("row {}", error.row()), "SKIPPED", error.to_string()));
    }
    for hydration in result.report.kept.iter().chain(&result.report.discarded) {
        for diagnostic in &hydration.diagnostics {
            rows.push((hydration.record_id.clone(), "NOTE", diagnostic.to_string()));
        }
    }
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Record"),
        header_cell("Severity"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for (record, severity, message) in rows {
        table.add_row(vec![
            Cell::new(record).fg(Color::Blue),
            severity_cell(severity),
            Cell::new(message),
        ]);
    }
    eprintln!();
    eprintln!("Issues:");
    eprintln!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
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

fn severity_cell(severity: &str) -> Cell {
    match severity {
        "FAILED" => Cell::new(severity)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        "SKIPPED" => Cell::new(severity).fg(Color::Yellow),
        _ => Cell::new(severity).fg(Color::DarkGrey),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
