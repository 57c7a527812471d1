//! Genre Catalog and Stock Codes
//!
//! The catalog is a fixed, ordered list of recognized genres. A stock code is
//! `<genre>-<NNN>` where `NNN` is the genre's 1-based catalog position; unknown
//! genres get position 1. Codes are labels, not keys: every item of a genre
//! shares the same code.

use serde::{Deserialize, Serialize};

/// Genres recognized out of the box, in display order
pub const DEFAULT_GENRES: [&str; 3] = ["アウター", "トップス", "ボトムス"];

/// Ordered genre catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreCatalog {
    genres: Vec<String>,
}

impl Default for GenreCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_GENRES)
    }
}

impl GenreCatalog {
    /// Build a catalog; an empty list falls back to the default genres
    pub fn new<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let genres: Vec<String> = genres.into_iter().map(Into::into).collect();
        if genres.is_empty() {
            return Self::default();
        }
        Self { genres }
    }

    /// 0-based catalog position
    pub fn position(&self, genre: &str) -> Option<usize> {
        self.genres.iter().position(|g| g == genre)
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.position(genre).is_some()
    }

    /// Genre preselected by the add-item form
    pub fn first(&self) -> Option<&str> {
        self.genres.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.genres.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    /// Stock code for an item of `genre`
    pub fn stock_code(&self, genre: &str) -> String {
        let suffix = self.position(genre).map_or(1, |index| index + 1);
        format!("{genre}-{suffix:03}")
    }
}

/// Stock code over the default catalog
pub fn generate_stock_code(genre: &str) -> String {
    GenreCatalog::default().stock_code(genre)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_code_follows_catalog_position() {
        let catalog = GenreCatalog::default();
        assert_eq!(catalog.stock_code("アウター"), "アウター-001");
        assert_eq!(catalog.stock_code("トップス"), "トップス-002");
        assert_eq!(catalog.stock_code("ボトムス"), "ボトムス-003");
    }

    #[test]
    fn test_unknown_genre_defaults_to_one() {
        assert_eq!(generate_stock_code("unknown"), "unknown-001");
        assert_eq!(generate_stock_code(""), "-001");
    }

    #[test]
    fn test_stock_code_is_deterministic() {
        let first = generate_stock_code("アウター");
        for _ in 0..10 {
            assert_eq!(generate_stock_code("アウター"), first);
        }
    }

    #[test]
    fn test_same_position_yields_same_suffix() {
        // Unknown genres share suffix 1 with the first catalog entry
        let a = generate_stock_code("x");
        let b = generate_stock_code("y");
        assert_eq!(a.rsplit('-').next(), b.rsplit('-').next());
        assert_eq!(generate_stock_code("アウター").rsplit('-').next(), Some("001"));
    }

    #[test]
    fn test_padding_beyond_three_digits() {
        let genres: Vec<String> = (0..1200).map(|i| format!("g{i}")).collect();
        let catalog = GenreCatalog::new(genres);
        assert_eq!(catalog.stock_code("g9"), "g9-010");
        assert_eq!(catalog.stock_code("g1100"), "g1100-1101");
    }

    #[test]
    fn test_empty_catalog_falls_back_to_default() {
        let catalog = GenreCatalog::new(Vec::<String>::new());
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.first(), Some("アウター"));
    }
}
