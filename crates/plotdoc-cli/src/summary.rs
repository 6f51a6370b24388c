use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use plotdoc_core::DatasetSummary;
use plotdoc_model::Columns;

use crate::types::{DatasetDump, ReloadResult, TreeEntry};

pub fn print_datasets(summaries: &[DatasetSummary]) {
    if summaries.is_empty() {
        println!("No datasets.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Kind"),
        header_cell("Size"),
        header_cell("Range"),
        header_cell("Linked to"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for summary in summaries {
        let range = match (&summary.error, summary.range) {
            (Some(error), _) => Cell::new(error).fg(Color::Red),
            (None, Some((min, max))) => Cell::new(format!("{min} .. {max}")),
            (None, None) => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&summary.name).add_attribute(Attribute::Bold),
            Cell::new(summary.kind),
            summary.size.map_or_else(|| dim_cell("-"), Cell::new),
            range,
            summary
                .linked
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
}

pub fn print_tree(entries: &[TreeEntry]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Widget"),
        header_cell("Type"),
        header_cell("Description"),
    ]);
    apply_compact_style(&mut table);
    for entry in entries {
        let name = if entry.depth == 0 {
            entry.path.clone()
        } else {
            format!("{}{}", "  ".repeat(entry.depth), entry.name)
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(&entry.kind).fg(Color::Cyan),
            Cell::new(&entry.description),
        ]);
    }
    println!("{table}");
}

pub fn print_dataset(name: &str, dump: &DatasetDump) {
    match dump {
        DatasetDump::Values(columns) => print_columns(name, columns),
        DatasetDump::Grid {
            xrange,
            yrange,
            rows,
        } => {
            println!(
                "{name}: {}x{} grid, x {} .. {}, y {} .. {}",
                rows.first().map_or(0, Vec::len),
                rows.len(),
                xrange.0,
                xrange.1,
                yrange.0,
                yrange.1
            );
            let mut table = Table::new();
            apply_compact_style(&mut table);
            for row in rows {
                table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
            }
            println!("{table}");
        }
    }
}

fn print_columns(name: &str, columns: &Columns) {
    let mut header = vec![header_cell("#"), header_cell(name)];
    let errors = [
        ("+-", columns.serr.as_ref()),
        ("-", columns.nerr.as_ref()),
        ("+", columns.perr.as_ref()),
    ];
    for (label, values) in &errors {
        if values.is_some() {
            header.push(header_cell(label));
        }
    }
    let width = header.len();
    let mut table = Table::new();
    table.set_header(header);
    apply_compact_style(&mut table);
    for index in 0..width {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (index, value) in columns.data.iter().enumerate() {
        let mut row = vec![dim_cell(index), Cell::new(value)];
        for values in errors.iter().filter_map(|(_, values)| *values) {
            row.push(values.get(index).map_or_else(|| dim_cell("-"), Cell::new));
        }
        table.add_row(row);
    }
    println!("{table}");
}

pub fn print_reload(result: &ReloadResult) {
    if result.summary.read.is_empty() {
        println!("No linked datasets refreshed.");
    } else {
        println!("Refreshed: {}", result.summary.read.join(", "));
    }
    if result.summary.has_errors() {
        let mut table = Table::new();
        table.set_header(vec![header_cell("Dataset"), header_cell("Errors")]);
        apply_compact_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Right);
        for (name, count) in result.summary.errors.iter().filter(|(_, count)| **count > 0) {
            table.add_row(vec![Cell::new(name), Cell::new(count).fg(Color::Red)]);
        }
        println!("{table}");
    }
    println!("Saved: {}", result.saved_to.display());
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn apply_compact_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
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

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
