//! Output formatting helpers for human-readable and JSON output.

use exam_archive::CounterMap;
use exam_archive::archive::CounterRecord;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    // Print header
    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  "));

    // Print rows
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  "));
    }
}

/// Print a counter map as a table or as the archive's JSON record array.
pub fn print_counters(
    counters: &CounterMap,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = counters
                .iter()
                .map(|(id, count)| vec![id.to_string(), count.to_string()])
                .collect();
            print_table(&["QUESTION", "CORRECT"], &rows);
        }
        OutputFormat::Json => {
            let records: Vec<CounterRecord> = counters
                .iter()
                .map(|(&question_id, &correct_times)| CounterRecord {
                    question_id,
                    correct_times,
                })
                .collect();
            println!("{}", serde_json::to_string(&records)?);
        }
    }
    Ok(())
}
