//! Minimal SpreadsheetML writer: one sheet, shared strings, no styles.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::application::export::{CellValue, PlacedCell};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "Sheet1";

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml error: {0}")]
    Xml(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn xml_error(err: impl std::fmt::Display) -> WorkbookError {
    WorkbookError::Xml(err.to_string())
}

/// Shared-strings table in first-use order.
#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        if let Some(&id) = self.index.get(value) {
            return id;
        }
        let id = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), id);
        id
    }
}

/// `1 -> A`, `27 -> AA`.
fn column_name(mut column: u32) -> String {
    let mut name = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        name.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Serializes `cells` into an xlsx archive. Later cells overwrite earlier ones
/// at the same coordinates.
pub fn write_workbook(cells: &[PlacedCell]) -> Result<Vec<u8>, WorkbookError> {
    let mut grid: BTreeMap<u32, BTreeMap<u32, &CellValue>> = BTreeMap::new();
    for cell in cells {
        grid.entry(cell.row)
            .or_default()
            .insert(cell.column, &cell.value);
    }

    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(&grid, &mut strings)?;
    let shared = shared_strings_xml(&strings)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
        ("xl/sharedStrings.xml", &shared),
    ];
    for (name, body) in parts {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        zip.write_all(body)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn sheet_xml(
    grid: &BTreeMap<u32, BTreeMap<u32, &CellValue>>,
    strings: &mut SharedStrings,
) -> Result<Vec<u8>, WorkbookError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("worksheet").with_attributes([("xmlns", MAIN_NS)]),
        ))
        .map_err(xml_error)?;

    let last_row = grid.keys().next_back().copied();
    let last_column = grid
        .values()
        .filter_map(|columns| columns.keys().next_back().copied())
        .max();
    if let (Some(row), Some(column)) = (last_row, last_column) {
        let reference = format!("A1:{}{row}", column_name(column));
        writer
            .write_event(Event::Empty(
                BytesStart::new("dimension").with_attributes([("ref", reference.as_str())]),
            ))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::Start(BytesStart::new("sheetData")))
        .map_err(xml_error)?;
    for (row, columns) in grid {
        let row_number = row.to_string();
        writer
            .write_event(Event::Start(
                BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
            ))
            .map_err(xml_error)?;
        for (column, value) in columns {
            let reference = format!("{}{row}", column_name(*column));
            let mut cell = BytesStart::new("c");
            cell.push_attribute(("r", reference.as_str()));
            let content = match value {
                CellValue::Number(number) => number.to_string(),
                CellValue::Text(text) => {
                    cell.push_attribute(("t", "s"));
                    strings.intern(text).to_string()
                }
            };
            writer.write_event(Event::Start(cell)).map_err(xml_error)?;
            write_text_element(&mut writer, "v", &content, false)?;
            writer
                .write_event(Event::End(BytesEnd::new("c")))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("row")))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("sheetData")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("worksheet")))
        .map_err(xml_error)?;

    Ok(writer.into_inner())
}

fn shared_strings_xml(strings: &SharedStrings) -> Result<Vec<u8>, WorkbookError> {
    let mut writer = Writer::new(Vec::new());
    let count = strings.values.len().to_string();
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("sst").with_attributes([
            ("xmlns", MAIN_NS),
            ("count", count.as_str()),
            ("uniqueCount", count.as_str()),
        ])))
        .map_err(xml_error)?;
    for value in &strings.values {
        writer
            .write_event(Event::Start(BytesStart::new("si")))
            .map_err(xml_error)?;
        let preserve = value.trim() != value;
        write_text_element(&mut writer, "t", value, preserve)?;
        writer
            .write_event(Event::End(BytesEnd::new("si")))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("sst")))
        .map_err(xml_error)?;

    Ok(writer.into_inner())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
    preserve_space: bool,
) -> Result<(), WorkbookError> {
    let mut start = BytesStart::new(name);
    if preserve_space {
        start.push_attribute(("xml:space", "preserve"));
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};

    use super::*;

    fn text(row: u32, column: u32, value: &str) -> PlacedCell {
        PlacedCell {
            row,
            column,
            value: CellValue::Text(value.to_string()),
        }
    }

    #[test]
    fn column_names_roll_over() {
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(6), "F");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(703), "AAA");
    }

    #[test]
    fn workbook_reads_back_with_calamine() {
        let cells = vec![
            PlacedCell {
                row: 1,
                column: 1,
                value: CellValue::Number(1),
            },
            text(1, 2, "Fish & <Chips>"),
            text(3, 4, " padded "),
            text(3, 6, "9.99"),
            text(3, 4, "Soup"),
            text(4, 4, "Soup"),
        ];

        let bytes = write_workbook(&cells).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        assert_eq!(range.get_value((0, 0)), Some(&Data::Float(1.0)));
        assert_eq!(
            range.get_value((0, 1)).map(|v| v.to_string()).as_deref(),
            Some("Fish & <Chips>")
        );
        assert_eq!(
            range.get_value((2, 3)).map(|v| v.to_string()).as_deref(),
            Some("Soup")
        );
        assert_eq!(
            range.get_value((2, 5)).map(|v| v.to_string()).as_deref(),
            Some("9.99")
        );
        assert_eq!(
            range.get_value((3, 3)).map(|v| v.to_string()).as_deref(),
            Some("Soup")
        );
        assert_eq!(range.get_value((1, 0)), Some(&Data::Empty));
    }

    #[test]
    fn empty_sheet_is_still_a_valid_workbook() {
        let bytes = write_workbook(&[]).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert!(range.is_empty());
    }
}
