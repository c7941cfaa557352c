//! Assemble tabular structures from page text or OCR table geometry.
//!
//! Native reconstruction is heuristic: architectural schedules render as
//! aligned text columns separated by runs of spaces. Consecutive lines that
//! split into two or more cells form a table block; the first line is taken
//! as the header row. OCR tables arrive pre-segmented and only need their
//! header rows flattened.

use regex::Regex;

use planfact_core::traits::OcrTable;
use planfact_core::types::page::PageText;

/// An unclassified table, as assembled from either source.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub page_index: usize,
    pub table_index: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Minimum consecutive multi-cell lines to call a block a table.
const MIN_TABLE_LINES: usize = 2;

/// Reconstruct tables from native positional text, page by page.
pub fn reconstruct_native(pages: &[PageText]) -> Vec<RawTable> {
    let cell_split = Regex::new(r" {2,}|\t+").unwrap();
    let mut tables = Vec::new();

    for page in pages {
        let mut table_index = 0usize;
        let mut block: Vec<Vec<String>> = Vec::new();

        for line in page.text.lines() {
            let cells: Vec<String> = cell_split
                .split(line.trim())
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if cells.len() >= 2 {
                block.push(cells);
            } else {
                flush_block(&mut block, page.page_index, &mut table_index, &mut tables);
            }
        }
        flush_block(&mut block, page.page_index, &mut table_index, &mut tables);
    }

    tables
}

fn flush_block(
    block: &mut Vec<Vec<String>>,
    page_index: usize,
    table_index: &mut usize,
    tables: &mut Vec<RawTable>,
) {
    if block.len() >= MIN_TABLE_LINES {
        let mut rows = std::mem::take(block);
        let headers = rows.remove(0);
        tables.push(RawTable {
            page_index,
            table_index: *table_index,
            headers,
            rows,
        });
        *table_index += 1;
    } else {
        block.clear();
    }
}

/// Convert OCR-provided table geometry, continuing each page's table
/// numbering after the natively reconstructed ones.
pub fn from_ocr_tables(ocr_tables: &[OcrTable], native: &[RawTable]) -> Vec<RawTable> {
    let mut converted = Vec::with_capacity(ocr_tables.len());
    for table in ocr_tables {
        let existing = native
            .iter()
            .chain(converted.iter())
            .filter(|t| t.page_index == table.page)
            .count();
        // Multi-row headers collapse into one row, cells joined column-wise.
        let headers = flatten_header_rows(&table.header_rows);
        converted.push(RawTable {
            page_index: table.page,
            table_index: existing,
            headers,
            rows: table.body_rows.clone(),
        });
    }
    converted
}

fn flatten_header_rows(header_rows: &[Vec<String>]) -> Vec<String> {
    let width = header_rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut headers = vec![String::new(); width];
    for row in header_rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.trim().is_empty() {
                continue;
            }
            if !headers[i].is_empty() {
                headers[i].push(' ');
            }
            headers[i].push_str(cell.trim());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> PageText {
        PageText::new(0, text.to_string(), false)
    }

    #[test]
    fn aligned_columns_become_a_table() {
        let text = "UNIT SCHEDULE\n\
                    UNIT    TYPE    NET SF\n\
                    1A      STUDIO  480\n\
                    1B      2BR     750\n";
        let tables = reconstruct_native(&[page(text)]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["UNIT", "TYPE", "NET SF"]);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[1], vec!["1B", "2BR", "750"]);
    }

    #[test]
    fn prose_does_not_become_a_table() {
        let text = "THIS IS A NARRATIVE PARAGRAPH ABOUT THE PROJECT\nWITH NO COLUMN STRUCTURE AT ALL\n";
        assert!(reconstruct_native(&[page(text)]).is_empty());
    }

    #[test]
    fn single_multi_cell_line_is_not_a_table() {
        let text = "LEFT COLUMN    RIGHT COLUMN\nnarrative text continues here\n";
        assert!(reconstruct_native(&[page(text)]).is_empty());
    }

    #[test]
    fn ocr_tables_continue_numbering_after_native() {
        let text = "UNIT    TYPE\n1A      STUDIO\n";
        let native = reconstruct_native(&[page(text)]);
        assert_eq!(native[0].table_index, 0);

        let ocr = vec![OcrTable {
            page: 0,
            header_rows: vec![
                vec!["LIGHT &".into(), "".into()],
                vec!["VENT".into(), "ROOM".into()],
            ],
            body_rows: vec![vec!["10 SF".into(), "BEDROOM".into()]],
        }];
        let converted = from_ocr_tables(&ocr, &native);
        assert_eq!(converted[0].table_index, 1);
        assert_eq!(converted[0].headers, vec!["LIGHT & VENT", "ROOM"]);
    }
}
