/*
 * comms-dashboard
 * Copyright © 2023 Centre for Policy Dialogue
 *
 * comms-dashboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * comms-dashboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with comms-dashboard. If not, see <https://www.gnu.org/licenses/>
 * and navigate to version 3 of the GNU General Public License.
 */

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use async_std::path::{Path, PathBuf};
use async_std::task;
use calamine::{DataType, Range, Reader};
use crate::common::*;
use crate::parse;

const WORKBOOK_EXTENSIONS: [&'static str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Rows at the top of every sheet which hold headings rather than data
const HEADER_ROWS: usize = 2;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug)]
pub enum IngestError {
    UnsupportedFormat { reason: String },
    NoSheets(String),
    NoSuchSheet(String),
    EmptySheet(String),
    OtherFailure(ErrorBox)
}

#[derive(Debug)]
pub struct ErrorBox(Box<dyn Error + Send + Sync + 'static>);

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat { reason } => {
                write!(f, "Format unsupported: {}", reason)
            },
            Self::NoSheets(file_name) => write!(f, "No worksheets in {}", file_name),
            Self::NoSuchSheet(name) => write!(f, "No sheet named {}", name),
            Self::EmptySheet(name) => write!(f, "Sheet {} holds no data", name),
            Self::OtherFailure(error) => {
                write!(f, "Other: {}", error)
            }
        }
    }
}

impl Display for ErrorBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::OtherFailure(ErrorBox(error)) => Some(error.deref()),
            _ => None
        }
    }
}

impl IngestError {
    pub fn unsupported<M>(reason: M) -> Self where M: Into<String> {
        Self::UnsupportedFormat { reason: reason.into() }
    }
}

impl From<ErrorBox> for IngestError {
    fn from(value: ErrorBox) -> Self {
        Self::OtherFailure(value)
    }
}

impl<E> From<E> for ErrorBox where E: Error + Send + Sync + 'static {
    fn from(value: E) -> Self {
        Self(Box::new(value))
    }
}

/// A spreadsheet file held in memory, every sheet already read
pub struct Workbook {
    name: String,
    sheets: Vec<(String, Range<DataType>)>
}

impl Debug for Workbook {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("name", &self.name)
            .field("sheets", &self.sheet_names().collect::<Vec<_>>())
            .finish()
    }
}

impl Workbook {
    /// A workbook must hold at least one worksheet; chart sheets are not read
    pub fn new(name: String, sheets: Vec<(String, Range<DataType>)>) -> IngestResult<Self> {
        if sheets.is_empty() {
            return Err(IngestError::NoSheets(name));
        }
        Ok(Self { name, sheets })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheet_names(&self) -> impl Iterator<Item=&str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    pub fn first_sheet(&self) -> Option<&str> {
        self.sheet_names().next()
    }

    /// Rows of a sheet ready for year inference: headers gone, excluded rows dropped
    pub fn rows_of(&self, sheet_name: &str) -> IngestResult<Vec<RawRow>> {
        let (_, range) = self.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .ok_or_else(|| IngestError::NoSuchSheet(sheet_name.to_string()))?;
        if range.is_empty() {
            return Err(IngestError::EmptySheet(sheet_name.to_string()));
        }
        let rows = data_rows(range);
        log::info!("Read {} data rows from sheet {} of {}", rows.len(), sheet_name, self.name);
        Ok(rows)
    }
}

/// Loads a spreadsheet file. Calamine's blocking I/O runs on its own thread
pub async fn load_workbook(path: &Path) -> IngestResult<Workbook> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| IngestError::unsupported("Not a file"))?;
    if file_name.starts_with('.') {
        return Err(IngestError::unsupported(format!("{} is a hidden file", file_name)));
    }
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IngestError::unsupported(format!("{} is not a spreadsheet", file_name)));
    }
    let path = PathBuf::from(path);
    let sheets = task::spawn_blocking(move || blocking_load_all_sheets(&path)).await?;
    Workbook::new(file_name, sheets)
}

fn blocking_load_all_sheets(source: &Path) -> IngestResult<Vec<(String, Range<DataType>)>> {
    let source_filename = source.to_string_lossy();
    log::info!("Loading spreadsheet from {}", source_filename);
    let mut workbook = calamine::open_workbook_auto(source).map_err(ErrorBox::from)?;
    let sheets = workbook.worksheets();
    log::info!("Loaded {} sheets from {}", sheets.len(), source_filename);
    Ok(sheets)
}

/// Spreadsheet column letters: A..Z, then AA, AB and so on
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        letters.push(char::from(b'A' + digit as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Int(number) => CellValue::Number(*number as f64),
        // Dates arrive as serials when calamine's dates feature is off
        DataType::Float(number) | DataType::DateTime(number) | DataType::Duration(number) => {
            CellValue::Number(*number)
        },
        DataType::String(value) | DataType::DateTimeIso(value) | DataType::DurationIso(value) => {
            CellValue::from(value.as_str())
        },
        DataType::Bool(value) => CellValue::from(if *value { "TRUE" } else { "FALSE" }),
        DataType::Empty | DataType::Error(_) => CellValue::Empty
    }
}

/// Converts a worksheet into rows keyed by column letter. Blank rows are skipped, then
/// the header rows, then any row whose date carries the exclusion marker
pub fn data_rows(range: &Range<DataType>) -> Vec<RawRow> {
    let (_, first_column) = range.start().unwrap_or((0, 0));
    let columns = (0..range.width())
        .map(|offset| column_letter(first_column as usize + offset))
        .collect::<Vec<_>>();

    range.rows()
        .map(|cells| {
            columns.iter()
                .zip(cells)
                .map(|(column, cell)| (column.as_str(), cell_value(cell)))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_blank())
        .skip(HEADER_ROWS)
        .filter(|row| {
            let excluded = parse::is_excluded(row.date_cell());
            if excluded {
                log::debug!("Skipping excluded row dated {}", row.date_cell());
            }
            !excluded
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use super::*;

    fn sheet(cells: &[&[DataType]]) -> Range<DataType> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|row| row.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (row, values) in cells.iter().enumerate() {
            for (column, value) in values.iter().enumerate() {
                range.set_value((row as u32, column as u32), value.clone());
            }
        }
        range
    }

    fn text(value: &str) -> DataType {
        DataType::String(value.to_string())
    }

    #[test]
    fn column_letters() {
        assert_eq!("A", column_letter(0));
        assert_eq!("F", column_letter(5));
        assert_eq!("Z", column_letter(25));
        assert_eq!("AA", column_letter(26));
        assert_eq!("AZ", column_letter(51));
        assert_eq!("BA", column_letter(52));
    }

    #[test]
    fn headers_and_excluded_rows_dropped() {
        let range = sheet(&[
            &[text("Communication overview")],
            &[text("Day"), text("Date"), text("Calls"), text("E-mails"), text("E-filings"), text("Fourth")],
            &[text("Mon"), text("1.1.2024"), DataType::Int(5), DataType::Empty, text("2"), DataType::Float(0.0)],
            &[text("Tue"), text("X"), DataType::Int(1), DataType::Int(1), DataType::Int(1), DataType::Int(1)],
            &[DataType::Empty, DataType::Empty, DataType::Empty, DataType::Empty, DataType::Empty, DataType::Empty],
            &[text("Wed"), text("3.1"), DataType::Int(2), DataType::Int(3), DataType::Empty, DataType::Empty]
        ]);
        let rows = data_rows(&range);
        assert_eq!(2, rows.len());
        assert_eq!(&CellValue::from("1.1.2024"), rows[0].date_cell());
        assert_eq!(&CellValue::Number(5.0), rows[0].metric_cell(Metric::Calls));
        assert_eq!(&CellValue::Empty, rows[0].metric_cell(Metric::Emails));
        assert_eq!(&CellValue::from("3.1"), rows[1].date_cell());
    }

    #[test]
    fn date_cells_become_serials() {
        let range = sheet(&[
            &[text("Heading")],
            &[text("Day"), text("Date")],
            &[text("Mon"), DataType::DateTime(45292.0)]
        ]);
        let rows = data_rows(&range);
        assert_eq!(&CellValue::Number(45292.0), rows[0].date_cell());
    }

    #[test]
    fn columns_keep_absolute_letters() {
        let mut range = Range::new((0, 1), (2, 2));
        range.set_value((0, 1), text("Date"));
        range.set_value((1, 1), text("Date"));
        range.set_value((2, 1), text("2.1.2024"));
        range.set_value((2, 2), DataType::Int(4));
        let rows = data_rows(&range);
        assert_eq!(&CellValue::from("2.1.2024"), rows[0].date_cell());
        assert_eq!(&CellValue::Number(4.0), rows[0].metric_cell(Metric::Calls));
    }

    #[test]
    fn sheets_by_name() {
        let workbook = Workbook::new(String::from("counts.xlsx"), vec![
            (String::from("January"), sheet(&[&[text("a")], &[text("b")], &[text("c"), text("1.1.2024")]])),
            (String::from("Blank"), Range::empty())
        ]).unwrap();
        assert_eq!(Some("January"), workbook.first_sheet());
        assert_eq!(1, workbook.rows_of("January").unwrap().len());
        assert_matches!(workbook.rows_of("February"), Err(IngestError::NoSuchSheet(_)));
        assert_matches!(workbook.rows_of("Blank"), Err(IngestError::EmptySheet(_)));
    }

    #[test]
    fn workbook_needs_a_worksheet() {
        assert_matches!(Workbook::new(String::from("charts.xlsx"), Vec::new()), Err(IngestError::NoSheets(name)) if name == "charts.xlsx");
    }

    #[test]
    fn rejects_other_files() {
        task::block_on(async {
            assert_matches!(load_workbook(Path::new("notes.txt")).await, Err(IngestError::UnsupportedFormat { .. }));
            assert_matches!(load_workbook(Path::new(".hidden.xlsx")).await, Err(IngestError::UnsupportedFormat { .. }));
            assert_matches!(load_workbook(Path::new("missing-file.xlsx")).await, Err(IngestError::OtherFailure(_)));
        });
    }
}
