//! Filter Engine
//!
//! Pure predicate over an item and the transient filter state held by the
//! inventory screen. All active conditions must hold; inactive ones pass.

use std::collections::BTreeSet;

use super::item::{InventoryItem, ItemStatus};

/// Filter controls state; empty fields mean "no restriction"
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Case-insensitive substring over stock code and title
    pub keyword: String,
    /// Exact genre, empty for all genres
    pub genre: String,
    /// Accepted statuses, empty for all statuses
    pub status: BTreeSet<ItemStatus>,
}

impl FilterState {
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status.insert(status);
        self
    }

    /// Flip a status checkbox
    pub fn toggle_status(&mut self, status: ItemStatus) {
        if !self.status.remove(&status) {
            self.status.insert(status);
        }
    }

    /// Reset every condition
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when the filter lets every item through
    pub fn is_empty(&self) -> bool {
        self.normalized_keyword().is_empty() && self.genre.is_empty() && self.status.is_empty()
    }

    fn normalized_keyword(&self) -> String {
        self.keyword.trim().to_lowercase()
    }
}

/// Whether `item` passes `filter`
pub fn matches(item: &InventoryItem, filter: &FilterState) -> bool {
    matches_normalized(item, filter, &filter.normalized_keyword())
}

fn matches_normalized(item: &InventoryItem, filter: &FilterState, keyword: &str) -> bool {
    if !keyword.is_empty()
        && !item.stock_code.to_lowercase().contains(keyword)
        && !item.title.to_lowercase().contains(keyword)
    {
        return false;
    }

    if !filter.genre.is_empty() && item.genre != filter.genre {
        return false;
    }

    if !filter.status.is_empty() && !filter.status.contains(&item.status) {
        return false;
    }

    true
}

/// Items passing `filter`, in input order
pub fn apply(items: &[InventoryItem], filter: &FilterState) -> Vec<InventoryItem> {
    let keyword = filter.normalized_keyword();
    items
        .iter()
        .filter(|item| matches_normalized(item, filter, &keyword))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemId, Marketplaces};

    fn make_item(id: &str, sku: &str, title: &str, genre: &str, status: ItemStatus) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(id),
            stock_code: sku.to_string(),
            title: title.to_string(),
            genre: genre.to_string(),
            status,
            price: 1000,
            sold_date: None,
            discount_date: None,
            image: None,
            marketplaces: Marketplaces::default(),
            created_at: None,
            updated_at: None,
        }
    }

    fn sample() -> Vec<InventoryItem> {
        vec![
            make_item("1", "A-001", "Jacket", "アウター", ItemStatus::ForSale),
            make_item("2", "B-001", "Shirt", "トップス", ItemStatus::OnHold),
            make_item("3", "アウター-001", "Down Jacket", "アウター", ItemStatus::ReservedSold),
            make_item("4", "ボトムス-003", "Denim", "ボトムス", ItemStatus::ForSale),
        ]
    }

    fn ids(items: &[InventoryItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_keyword_matches_title_case_insensitively() {
        let items = vec![
            make_item("1", "A-001", "Jacket", "", ItemStatus::ForSale),
            make_item("2", "B-001", "Shirt", "", ItemStatus::OnHold),
        ];
        let filter = FilterState::default().with_keyword("jacket");
        assert_eq!(ids(&apply(&items, &filter)), vec!["1"]);
    }

    #[test]
    fn test_keyword_matches_stock_code_and_is_trimmed() {
        let filter = FilterState::default().with_keyword("  b-00 ");
        assert_eq!(ids(&apply(&sample(), &filter)), vec!["2"]);
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let items = sample();
        let filter = FilterState::default().with_keyword("   ");
        assert!(filter.is_empty());
        assert_eq!(apply(&items, &filter), items);
    }

    #[test]
    fn test_genre_is_exact_match() {
        let filter = FilterState::default().with_genre("アウター");
        assert_eq!(ids(&apply(&sample(), &filter)), vec!["1", "3"]);

        let partial = FilterState::default().with_genre("アウ");
        assert!(apply(&sample(), &partial).is_empty());
    }

    #[test]
    fn test_status_set_is_or_semantics() {
        let filter = FilterState::default()
            .with_status(ItemStatus::ReservedSold)
            .with_status(ItemStatus::OnHold);
        assert_eq!(ids(&apply(&sample(), &filter)), vec!["2", "3"]);

        // For-sale items stay out even when keyword and genre match
        let narrowed = filter.clone().with_keyword("jacket").with_genre("アウター");
        assert_eq!(ids(&apply(&sample(), &narrowed)), vec!["3"]);
    }

    #[test]
    fn test_conditions_combine_with_and() {
        let filter = FilterState::default()
            .with_keyword("jacket")
            .with_status(ItemStatus::ForSale);
        assert_eq!(ids(&apply(&sample(), &filter)), vec!["1"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let items = sample();
        let filters = [
            FilterState::default(),
            FilterState::default().with_keyword("JACKET"),
            FilterState::default().with_genre("アウター").with_status(ItemStatus::ForSale),
            FilterState::default().with_status(ItemStatus::OnHold),
        ];
        for filter in &filters {
            let once = apply(&items, filter);
            assert_eq!(apply(&once, filter), once);
        }
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut filter = FilterState::default().with_keyword("x").with_genre("トップス");
        filter.toggle_status(ItemStatus::OnHold);
        assert!(filter.status.contains(&ItemStatus::OnHold));
        filter.toggle_status(ItemStatus::OnHold);
        assert!(filter.status.is_empty());

        filter.clear();
        assert_eq!(filter, FilterState::default());
    }

    #[test]
    fn test_matches_single_item() {
        let item = make_item("1", "A-001", "Jacket", "アウター", ItemStatus::ForSale);
        assert!(matches(&item, &FilterState::default()));
        assert!(!matches(&item, &FilterState::default().with_status(ItemStatus::OnHold)));
    }
}
