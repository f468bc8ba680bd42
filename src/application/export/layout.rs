//! Row placement for the exported sheet.
//!
//! A single cursor walks the sheet top to bottom: a menu header, then each of
//! its submenus followed by that submenu's dishes, then the next menu. Menus
//! sit in column A, submenus one column to the right, dishes one further, and
//! dish rows carry the price in a fourth data column. Numbering restarts per
//! parent. Rows and columns are 1-based and every cell is written once.

use std::fmt;

use thiserror::Error;
use tracing::warn;

use super::partition::Partition;

/// Hard row limit of the xlsx format.
pub const MAX_ROWS: u32 = 1_048_576;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCell {
    pub row: u32,
    pub column: u32,
    pub value: CellValue,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("catalog does not fit in a sheet: row {row} exceeds {max_rows}")]
    TooManyRows { row: u32, max_rows: u32 },
}

struct Placement {
    cells: Vec<PlacedCell>,
    next_row: u32,
    max_rows: u32,
}

impl Placement {
    /// Claims the next free row.
    fn advance(&mut self) -> Result<u32, LayoutError> {
        let row = self.next_row;
        if row > self.max_rows {
            return Err(LayoutError::TooManyRows {
                row,
                max_rows: self.max_rows,
            });
        }
        self.next_row += 1;
        Ok(row)
    }

    fn put(&mut self, row: u32, column: u32, value: CellValue) {
        self.cells.push(PlacedCell { row, column, value });
    }

    fn put_text(&mut self, row: u32, column: u32, value: Option<&str>) {
        if let Some(text) = value {
            self.put(row, column, CellValue::Text(text.to_string()));
        }
    }

    fn put_number(&mut self, row: u32, column: u32, index: usize) {
        self.put(row, column, CellValue::Number(index as i64 + 1));
    }
}

/// Cells in sheet order.
pub fn place(partition: &Partition) -> Result<Vec<PlacedCell>, LayoutError> {
    place_within(partition, MAX_ROWS)
}

fn place_within(partition: &Partition, max_rows: u32) -> Result<Vec<PlacedCell>, LayoutError> {
    let mut submenus_of = vec![Vec::new(); partition.menus.len()];
    for (index, submenu) in partition.submenus.iter().enumerate() {
        submenus_of[submenu.menu].push(index);
    }
    let mut dishes_of = vec![Vec::new(); partition.submenus.len()];
    for (index, dish) in partition.dishes.iter().enumerate() {
        dishes_of[dish.submenu].push(index);
    }

    let mut sheet = Placement {
        cells: Vec::new(),
        next_row: 1,
        max_rows,
    };

    for (menu_number, (menu, submenus)) in partition.menus.iter().zip(&submenus_of).enumerate() {
        let row = sheet.advance()?;
        sheet.put_number(row, 1, menu_number);
        sheet.put_text(row, 2, Some(&menu.title));
        sheet.put_text(row, 3, menu.description.as_deref());

        let mut menu_dishes = 0;
        for (submenu_number, &submenu_index) in submenus.iter().enumerate() {
            let submenu = &partition.submenus[submenu_index];
            let row = sheet.advance()?;
            sheet.put_number(row, 2, submenu_number);
            sheet.put_text(row, 3, Some(&submenu.title));
            sheet.put_text(row, 4, submenu.description.as_deref());

            let dishes = &dishes_of[submenu_index];
            for (dish_number, &dish_index) in dishes.iter().enumerate() {
                let dish = &partition.dishes[dish_index];
                let row = sheet.advance()?;
                sheet.put_number(row, 3, dish_number);
                sheet.put_text(row, 4, Some(&dish.title));
                sheet.put_text(row, 5, dish.description.as_deref());
                if let Some(price) = dish.price {
                    sheet.put(row, 6, CellValue::Text(price.to_string()));
                }
            }

            if dishes.len() as i64 != submenu.dishes_count {
                warn!(
                    target = "carte::application::export",
                    submenu = %submenu.title,
                    counted = submenu.dishes_count,
                    exported = dishes.len(),
                    "submenu dish counter disagrees with exported rows"
                );
            }
            menu_dishes += dishes.len() as i64;
        }

        if menu_dishes != menu.dishes_count {
            warn!(
                target = "carte::application::export",
                menu = %menu.title,
                counted = menu.dishes_count,
                exported = menu_dishes,
                "menu dish counter disagrees with exported rows"
            );
        }
    }

    Ok(sheet.cells)
}
