//! Renderers for result tables.

use console::measure_text_width;

use claimscan_core::ResultTable;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// CSV with a header row
    Csv,
    /// JSON array of row objects
    Json,
}

pub fn render(table: &ResultTable, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(format_table(table)),
        OutputFormat::Csv => format_csv(table),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&table.to_records())?),
    }
}

fn format_table(table: &ResultTable) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| measure_text_width(c)).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let mut output = String::new();
    push_line(&mut output, &table.columns, &widths);

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut output, &separator, &widths);

    for row in &table.rows {
        push_line(&mut output, &row.cells, &widths);
    }

    output.truncate(output.trim_end().len());
    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            // Thai vowel and tone marks have zero display width
            let padding = width.saturating_sub(measure_text_width(cell));
            format!("{}{}", cell, " ".repeat(padding))
        })
        .collect();

    output.push_str(padded.join(" | ").trim_end());
    output.push('\n');
}

fn format_csv(table: &ResultTable) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(&row.cells)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
