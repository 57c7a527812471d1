//! Add-Item Form Validation
//!
//! Turns raw form input into a `NewItemRequest`. The mutation gateway trusts
//! its input, so this check runs before anything is submitted.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{GenreCatalog, ItemStatus, Marketplaces, NewItemRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title, genre and price are required")]
    MissingRequired,

    #[error("unknown genre: {0}")]
    UnknownGenre(String),

    #[error("price must be a whole non-negative number: {0}")]
    InvalidPrice(String),

    #[error("invalid {field} date: {value}")]
    InvalidDate { field: &'static str, value: String },
}

/// Raw values as typed into the add-item dialog
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemForm {
    pub title: String,
    pub genre: String,
    pub status: ItemStatus,
    pub price: String,
    pub sold_date: String,
    pub discount_date: String,
    pub image: String,
    pub marketplaces: Marketplaces,
}

impl ItemForm {
    /// Empty form with the first catalog genre preselected
    pub fn new(catalog: &GenreCatalog) -> Self {
        Self {
            genre: catalog.first().unwrap_or_default().to_string(),
            ..Default::default()
        }
    }

    /// Stock code the item will receive, if a genre is chosen
    pub fn preview_stock_code(&self, catalog: &GenreCatalog) -> Option<String> {
        (!self.genre.is_empty()).then(|| catalog.stock_code(&self.genre))
    }

    pub fn validate(&self, catalog: &GenreCatalog) -> Result<NewItemRequest, ValidationError> {
        let title = self.title.trim();
        let price = self.price.trim();
        if title.is_empty() || self.genre.is_empty() || price.is_empty() {
            return Err(ValidationError::MissingRequired);
        }

        if !catalog.contains(&self.genre) {
            return Err(ValidationError::UnknownGenre(self.genre.clone()));
        }

        if !price.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidPrice(price.to_string()));
        }
        let price = price
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidPrice(price.to_string()))?;

        Ok(NewItemRequest {
            title: title.to_string(),
            genre: self.genre.clone(),
            status: self.status,
            price,
            sold_date: parse_date("sold", &self.sold_date)?,
            discount_date: parse_date("discount", &self.discount_date)?,
            image: non_empty(&self.image),
            marketplaces: self.marketplaces,
        })
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}
