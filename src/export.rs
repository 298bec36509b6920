//! Spreadsheet output.
//!
//! CSV is the interim format (loss-free, everything stays text); workbooks
//! are the final deliverable.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Image, Workbook, Worksheet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::net::PageSource;
use crate::types::{Cell, SheetRow};

pub const THUMBNAIL_HEADER: &str = "image";
pub const THUMBNAIL_SIZE: u32 = 40;
pub const THUMBNAIL_ROW_HEIGHT: f64 = 50.0;
pub const THUMBNAIL_COLUMN_WIDTH: f64 = 50.0;

pub fn write_csv<R: Serialize>(path: &Path, rows: &[R]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

pub fn read_csv<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open {:?}", path))?;

    reader
        .deserialize()
        .collect::<Result<Vec<R>, _>>()
        .with_context(|| format!("Failed to read rows from {:?}", path))
}

/// Thumbnail bytes memoized by URL for the whole run. A failed fetch is
/// remembered too, so a dead URL is only requested once.
pub struct Thumbnails<'a, S: PageSource> {
    source: &'a S,
    placeholder: String,
    fetched: HashMap<String, Option<Vec<u8>>>,
}

impl<'a, S: PageSource> Thumbnails<'a, S> {
    pub fn new(source: &'a S, placeholder: &str) -> Self {
        Self {
            source,
            placeholder: placeholder.to_string(),
            fetched: HashMap::new(),
        }
    }

    fn bytes(&mut self, url: &str) -> Option<&[u8]> {
        let source = self.source;
        self.fetched
            .entry(url.to_string())
            .or_insert_with(|| match source.fetch_bytes(url) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Failed to fetch image {}: {}", url, e);
                    None
                }
            })
            .as_deref()
    }

    /// Image for `url`, or the placeholder when the URL is empty or its bytes
    /// cannot be fetched or decoded. Only a broken placeholder is an error.
    pub fn image(&mut self, url: Option<&str>) -> Result<Image> {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            if let Some(bytes) = self.bytes(url) {
                match Image::new_from_buffer(bytes) {
                    Ok(image) => return Ok(scaled(image)),
                    Err(e) => warn!("Failed to decode image {}: {}", url, e),
                }
            }
        }

        let placeholder = self.placeholder.clone();
        let bytes = self
            .bytes(&placeholder)
            .with_context(|| format!("Failed to fetch placeholder image {}", placeholder))?;
        let image = Image::new_from_buffer(bytes)
            .with_context(|| format!("Failed to decode placeholder image {}", placeholder))?;
        Ok(scaled(image))
    }

    pub fn cached(&self) -> usize {
        self.fetched.len()
    }
}

fn scaled(image: Image) -> Image {
    image.set_scale_to_size(THUMBNAIL_SIZE, THUMBNAIL_SIZE, true)
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Text(text) => sheet.write_string(row, col, text)?,
        Cell::Number(number) => sheet.write_number(row, col, *number)?,
        Cell::Bool(flag) => sheet.write_boolean(row, col, *flag)?,
    };
    Ok(())
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    Ok(())
}

/// Builds a workbook one named sheet at a time.
pub struct WorkbookWriter {
    workbook: Workbook,
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
        }
    }

    /// Header row from `R::HEADERS`, then one row per record in order.
    pub fn add_sheet<R: SheetRow>(&mut self, name: &str, rows: &[R]) -> Result<()> {
        let sheet = self.workbook.add_worksheet();
        sheet
            .set_name(name)
            .with_context(|| format!("Invalid sheet name {:?}", name))?;

        write_header(sheet, R::HEADERS)?;
        for (i, record) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            for (col, cell) in record.cells().iter().enumerate() {
                write_cell(sheet, row, col as u16, cell)?;
            }
        }

        debug!(sheet = name, rows = rows.len(), "sheet written");
        Ok(())
    }

    /// Like `add_sheet`, plus a trailing thumbnail column filled from each
    /// record's `image_url`.
    pub fn add_sheet_with_images<R: SheetRow, S: PageSource>(
        &mut self,
        name: &str,
        rows: &[R],
        thumbnails: &mut Thumbnails<'_, S>,
    ) -> Result<()> {
        self.add_sheet(name, rows)?;

        let sheet = self
            .workbook
            .worksheet_from_name(name)
            .with_context(|| format!("Sheet {:?} vanished", name))?;
        let col = R::HEADERS.len() as u16;
        let bold = Format::new().set_bold();
        sheet.write_string_with_format(0, col, THUMBNAIL_HEADER, &bold)?;
        sheet.set_column_width(col, THUMBNAIL_COLUMN_WIDTH)?;

        for (i, record) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            let image = thumbnails.image(record.image_url())?;
            sheet.set_row_height(row, THUMBNAIL_ROW_HEIGHT)?;
            sheet.insert_image(row, col, &image)?;
            info!("Inserted image for row {}", row);
        }

        Ok(())
    }

    pub fn save(mut self, path: &Path) -> Result<()> {
        self.workbook
            .save(path)
            .with_context(|| format!("Failed to save workbook {:?}", path))?;
        info!("Saved {:?}", path);
        Ok(())
    }
}

/// Single-sheet workbook of `rows`.
pub fn write_workbook<R: SheetRow>(path: &Path, sheet: &str, rows: &[R]) -> Result<()> {
    let mut writer = WorkbookWriter::new();
    writer.add_sheet(sheet, rows)?;
    writer.save(path)
}

/// Copy an interim CSV into a single-sheet workbook, header row included.
/// Values are written as text so nothing is reinterpreted.
pub fn csv_to_workbook(csv_path: &Path, xlsx_path: &Path, sheet: &str) -> Result<usize> {
    let mut reader =
        csv::Reader::from_path(csv_path).with_context(|| format!("Failed to open {:?}", csv_path))?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet)
        .with_context(|| format!("Invalid sheet name {:?}", sheet))?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
    write_header(worksheet, &headers)?;

    let mut rows = 0;
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad row {} in {:?}", i + 1, csv_path))?;
        for (col, value) in record.iter().enumerate() {
            worksheet.write_string(i as u32 + 1, col as u16, value)?;
        }
        rows += 1;
    }

    workbook
        .save(xlsx_path)
        .with_context(|| format!("Failed to save workbook {:?}", xlsx_path))?;
    info!("Converted {:?} to {:?} ({} rows)", csv_path, xlsx_path, rows);
    Ok(rows)
}
