use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use dbpres_viewer::data::Catalog;
use dbpres_viewer::solr::response::cell_text;
use dbpres_viewer::solr::SortDirection;
use dbpres_viewer::state::TableViewState;

fn truncate(text: &str, max_width: usize) -> String {
    if max_width == 0 || text.chars().count() <= max_width {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn display_catalog(catalog: &Catalog, selected: Option<&str>) {
    for schema in &catalog.schemas {
        println!("{}", schema.name.as_str().blue().bold());
        for table in &schema.tables {
            let marker = if Some(table.id.as_str()) == selected { "*" } else { " " };
            let columns = table
                .columns
                .as_ref()
                .map(|c| format!(" ({} columns)", c.len()))
                .unwrap_or_default();
            println!("  {} {}{}", marker, table.id, columns);
        }
    }
}

pub fn display_table(state: &TableViewState, max_cell_width: usize) {
    let Some(table_id) = state.table_id.as_deref() else {
        println!("{}", "No table selected. Use \\use <schema.table>.".yellow());
        return;
    };

    if let Some(error) = &state.error {
        eprintln!("{}", format!("Error: {}", error).red());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = state
        .columns
        .iter()
        .map(|column| {
            let marker = if !state.is_searching() && column.position == state.sort.column {
                match state.sort.direction {
                    SortDirection::Asc => " ↑",
                    SortDirection::Desc => " ↓",
                }
            } else {
                ""
            };
            let label = if column.type_tag.is_empty() {
                format!("{}. {}{}", column.position, column.name, marker)
            } else {
                format!("{}. {}{}\n{}", column.position, column.name, marker, column.type_tag)
            };
            Cell::new(label).add_attribute(Attribute::Bold)
        })
        .collect();
    table.set_header(headers);

    for row in &state.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|value| truncate(&cell_text(value), max_cell_width))
            .collect();
        table.add_row(cells);
    }

    println!("{}", table_id.cyan().bold());
    if state.rows.is_empty() {
        println!("{}", "No rows.".yellow());
    } else {
        println!("{table}");
    }

    let summary = match state.search_hits {
        Some(hits) if state.query.is_empty() => {
            format!("{} rows listed ({} in table)", state.rows.len(), hits)
        }
        Some(hits) => format!(
            "{} matches for '{}', showing {}",
            hits,
            state.query,
            state.rows.len()
        ),
        None => format!(
            "Page {}/{} · {} rows per page · {} rows",
            state.current_page(),
            state.num_pages(),
            state.window.rows,
            state.num_found
        ),
    };
    println!("{}", summary.green());
}

pub fn export_to_csv(state: &TableViewState, filename: &str) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_path(filename)?;

    let headers: Vec<&str> = state.columns.iter().map(|c| c.name.as_str()).collect();
    wtr.write_record(&headers)?;

    for row in &state.rows {
        let record: Vec<String> = row.iter().map(cell_text).collect();
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(state.rows.len())
}
