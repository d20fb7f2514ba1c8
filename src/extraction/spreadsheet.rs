//! Spreadsheet reading via calamine.

use std::fmt::Write;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use super::{ExtractionError, TabularData};

fn spreadsheet_error(e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::Spreadsheet(e.to_string())
}

/// Spreadsheet column letters for a 0-based column index (0 → `A`, 26 → `AA`).
fn column_letters(index: u32) -> String {
    let mut n = index as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn cell_reference((row, col): (u32, u32)) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A1-style extent of a range, or `Empty`.
fn dimensions(range: &Range<Data>) -> String {
    match (range.start(), range.end()) {
        (Some(start), Some(end)) if !range.is_empty() => {
            format!("{}:{}", cell_reference(start), cell_reference(end))
        }
        _ => "Empty".to_string(),
    }
}

pub(super) fn tabular_from_range(range: &Range<Data>) -> TabularData {
    let first_col = range.start().map(|(_, c)| c).unwrap_or(0);
    let mut rows = range.rows();

    let columns = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = cell_to_string(cell);
                if name.trim().is_empty() {
                    format!("Column{}", first_col as usize + i + 1)
                } else {
                    name
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    TabularData { columns, rows }
}

pub(super) fn summarize_workbook_header(out: &mut String, file_name: &str, sheet_count: usize) {
    let _ = write!(
        out,
        "Workbook: {}\nWorksheets: {}\n\n",
        file_name, sheet_count
    );
}

pub(super) fn summarize_sheet(out: &mut String, name: &str, range: &Range<Data>) {
    let (height, width) = if range.is_empty() {
        (0, 0)
    } else {
        range.get_size()
    };
    let _ = write!(
        out,
        "Worksheet: {}\nDimensions: {}\nRows: {}\nColumns: {}\n\n",
        name,
        dimensions(range),
        height,
        width
    );
}

pub(super) fn read_tabular(path: &Path) -> Result<TabularData, ExtractionError> {
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ExtractionError::NoWorksheets)?;
    let range = workbook.worksheet_range(&first).map_err(spreadsheet_error)?;
    Ok(tabular_from_range(&range))
}

pub(super) fn workbook_summary(path: &Path) -> Result<String, ExtractionError> {
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let names = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return Err(ExtractionError::NoWorksheets);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = String::new();
    summarize_workbook_header(&mut out, &file_name, names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(spreadsheet_error)?;
        summarize_sheet(&mut out, &name, &range);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_range() -> Range<Data> {
        // B2:D4 with a blank header in column C
        let mut range = Range::new((1, 1), (3, 3));
        range.set_value((1, 1), Data::String("name".into()));
        range.set_value((1, 3), Data::String("amount".into()));
        range.set_value((2, 1), Data::String("apples".into()));
        range.set_value((2, 2), Data::Bool(true));
        range.set_value((2, 3), Data::Float(2.5));
        range.set_value((3, 1), Data::String("pears".into()));
        range.set_value((3, 3), Data::Int(7));
        range
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_tabular_uses_absolute_index_for_blank_headers() {
        let table = tabular_from_range(&sample_range());
        assert_eq!(table.columns, vec!["name", "Column3", "amount"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["apples".to_string(), "true".into(), "2.5".into()],
                vec!["pears".to_string(), "".into(), "7".into()],
            ]
        );
    }

    #[test]
    fn test_tabular_of_empty_range() {
        let table = tabular_from_range(&Range::empty());
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_summary_lists_dimensions() {
        let mut out = String::new();
        summarize_workbook_header(&mut out, "budget.xlsx", 2);
        summarize_sheet(&mut out, "Data", &sample_range());
        summarize_sheet(&mut out, "Blank", &Range::empty());
        assert_eq!(
            out,
            "Workbook: budget.xlsx\nWorksheets: 2\n\n\
             Worksheet: Data\nDimensions: B2:D4\nRows: 3\nColumns: 3\n\n\
             Worksheet: Blank\nDimensions: Empty\nRows: 0\nColumns: 0\n\n"
        );
    }
}
