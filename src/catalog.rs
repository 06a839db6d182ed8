//! Price list loading
//!
//! The price list is a CSV file with the columns `Категория`, `Услуга`,
//! `Цена`, `Комментарий`. A blank category continues the last declared one,
//! so a file can list a category once above a block of services.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::error::CatalogError;
use price_matcher::CatalogEntry;

pub const CATEGORY_COLUMN: &str = "Категория";
pub const SERVICE_COLUMN: &str = "Услуга";
pub const PRICE_COLUMN: &str = "Цена";
pub const COMMENT_COLUMN: &str = "Комментарий";

/// Load the price list from a CSV file
pub fn load_price_list(path: impl AsRef<Path>) -> Result<Vec<CatalogEntry>, CatalogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatalogError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path)?;
    let entries = load_price_list_from_reader(file)?;

    let categories: BTreeSet<&str> = entries.iter().map(|e| e.category.as_str()).collect();
    info!(
        "Loaded {} price list entries in {} categories from {}",
        entries.len(),
        categories.len(),
        path.display()
    );
    Ok(entries)
}

/// Load the price list from any CSV source
pub fn load_price_list_from_reader<R: Read>(reader: R) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::locate(&headers);
    debug!("Price list columns: {:?}", columns);

    let mut entries = Vec::new();
    let mut last_category = String::new();

    for result in reader.records() {
        let row = result?;

        let category = columns.field(&row, columns.category);
        if !category.is_empty() {
            last_category = category.to_string();
        }

        entries.push(CatalogEntry::new(
            last_category.clone(),
            columns.field(&row, columns.service),
            columns.field(&row, columns.price),
            columns.field(&row, columns.comment),
        ));
    }

    Ok(entries)
}

/// Column positions; a missing column reads as empty in every row
#[derive(Debug, Clone, Copy)]
struct Columns {
    category: Option<usize>,
    service: Option<usize>,
    price: Option<usize>,
    comment: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Self {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        Self {
            category: position(CATEGORY_COLUMN),
            service: position(SERVICE_COLUMN),
            price: position(PRICE_COLUMN),
            comment: position(COMMENT_COLUMN),
        }
    }

    fn field<'r>(&self, row: &'r StringRecord, column: Option<usize>) -> &'r str {
        column.and_then(|idx| row.get(idx)).map(str::trim).unwrap_or("")
    }
}
