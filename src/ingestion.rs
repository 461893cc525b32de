use crate::error::{MarginEngineError, Result};
use crate::schema::{CostCatalogEntry, FixedCostEntry};
use calamine::{open_workbook, Data, Range, Reader, Xls, Xlsx};
use log::debug;
use scraper::{ElementRef, Html, Selector};
use std::fs::{self, File};
use std::path::Path;

/// A raw sales export loaded into memory. Every cell is still a string;
/// typing happens in the cleaning stage.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SalesTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Loads a sales export. Dispatches on the file extension: `.xlsx` via the
/// modern spreadsheet reader, `.xls` via the legacy binary reader with a
/// markup-table fallback, anything else as delimited text.
pub fn load_sales_table<P: AsRef<Path>>(path: P) -> Result<SalesTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MarginEngineError::MissingFile(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" => load_xlsx_table(path),
        "xls" => load_legacy_xls_table(path),
        _ => load_csv_table(path),
    }
}

pub fn load_cost_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CostCatalogEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MarginEngineError::MissingFile(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);

    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let entry: CostCatalogEntry = result?;
        entries.push(entry);
    }

    debug!("Loaded {} variable-cost entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn load_fixed_costs<P: AsRef<Path>>(path: P) -> Result<Vec<FixedCostEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MarginEngineError::MissingFile(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);

    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let entry: FixedCostEntry = result?;
        entries.push(entry);
    }

    debug!("Loaded {} fixed-cost entries from {}", entries.len(), path.display());
    Ok(entries)
}

fn load_csv_table(path: &Path) -> Result<SalesTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);

    let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(SalesTable { headers, rows })
}

fn load_xlsx_table(path: &Path) -> Result<SalesTable> {
    let mut workbook: Xlsx<std::io::BufReader<File>> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| MarginEngineError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MarginEngineError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| MarginEngineError::Spreadsheet(e.to_string()))?;

    range_to_table(&range).ok_or_else(|| MarginEngineError::Parse {
        path: path.to_path_buf(),
        details: "first worksheet is empty".to_string(),
    })
}

/// Legacy binary export. Real XLS files parse natively; many old POS systems
/// export an HTML table under an `.xls` name, so a native failure falls back
/// to markup extraction over the same bytes. Both must fail before the call
/// errors out.
fn load_legacy_xls_table(path: &Path) -> Result<SalesTable> {
    match try_native_xls(path) {
        Ok(table) => Ok(table),
        Err(native_err) => {
            debug!(
                "Native XLS parse of {} failed ({}), trying markup-table fallback",
                path.display(),
                native_err
            );
            let bytes = fs::read(path)?;
            parse_markup_table(&bytes, path).map_err(|fallback_err| MarginEngineError::Parse {
                path: path.to_path_buf(),
                details: format!(
                    "binary parse failed ({}); markup fallback failed ({})",
                    native_err, fallback_err
                ),
            })
        }
    }
}

fn try_native_xls(path: &Path) -> std::result::Result<SalesTable, String> {
    let mut workbook: Xls<std::io::BufReader<File>> =
        open_workbook(path).map_err(|e: calamine::XlsError| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no sheets".to_string())?
        .map_err(|e| e.to_string())?;
    range_to_table(&range).ok_or_else(|| "first sheet is empty".to_string())
}

fn range_to_table(range: &Range<Data>) -> Option<SalesTable> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows.next()?.iter().map(cell_to_string).collect();
    let data_rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Some(SalesTable {
        headers,
        rows: data_rows,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Extracts the first `<table>` from markup. Cell text is normalized from
/// the decimal-comma / thousands-dot convention these exports use.
pub(crate) fn parse_markup_table(bytes: &[u8], path: &Path) -> Result<SalesTable> {
    let text = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&text);

    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| MarginEngineError::Parse {
            path: path.to_path_buf(),
            details: "no <table> element found".to_string(),
        })?;

    let mut table_rows = table.select(&row_selector);

    let headers: Vec<String> = match table_rows.next() {
        Some(tr) => tr.select(&cell_selector).map(|c| element_text(&c)).collect(),
        None => {
            return Err(MarginEngineError::Parse {
                path: path.to_path_buf(),
                details: "table has no rows".to_string(),
            })
        }
    };

    let mut rows = Vec::new();
    for tr in table_rows {
        let cells: Vec<String> = tr
            .select(&cell_selector)
            .map(|c| normalize_markup_cell(&element_text(&c)))
            .collect();
        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells);
        }
    }

    Ok(SalesTable { headers, rows })
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// "1.234,56" -> "1234.56"; "1.234" -> "1234"; non-numeric text untouched.
fn normalize_markup_cell(raw: &str) -> String {
    let value = raw.replace('\u{a0}', " ").trim().to_string();
    if value.is_empty() {
        return value;
    }

    let numeric_shape = value
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == ',' || c == '-')
        && value.chars().any(|c| c.is_ascii_digit());
    if !numeric_shape {
        return value;
    }

    if value.contains(',') {
        value.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(&value) {
        value.replace('.', "")
    } else {
        value
    }
}

fn is_thousands_grouped(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let groups: Vec<&str> = unsigned.split('.').collect();

    groups.len() >= 2
        && !groups[0].is_empty()
        && groups[0].len() <= 3
        && groups[0].chars().all(|c| c.is_ascii_digit())
        && groups[1..]
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}
