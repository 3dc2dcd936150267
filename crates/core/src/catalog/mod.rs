//! Read-only product catalog.

/// Built-in sample listings.
pub mod sample;

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::models::Product;

/// Failures while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Catalog location.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The catalog file is not a valid JSON product list.
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        /// Catalog location.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A listing has an empty identifier.
    #[error("listing at position {0} has an empty id")]
    MissingId(usize),
    /// Two listings share an identifier.
    #[error("duplicate listing id '{0}'")]
    DuplicateId(String),
    /// A listing asks for nothing.
    #[error("listing '{0}' must have a positive initial price")]
    NonPositivePrice(String),
    /// Seller rating outside `[0, 5]`.
    #[error("listing '{id}' has seller rating {rating} outside 0..=5")]
    RatingOutOfRange {
        /// Listing identifier.
        id: String,
        /// Offending rating.
        rating: f32,
    },
}

/// Ordered, immutable list of listings.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog after validating every listing.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        validate(&products)?;
        Ok(Self { products })
    }

    /// Catalog backed by the built-in sample listings.
    pub fn sample() -> Self {
        Self {
            products: sample::products(chrono::Utc::now()),
        }
    }

    /// Load a JSON array of listings from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let products: Vec<Product> =
            serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::new(products)?;
        info!(path = %path.display(), total = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// All listings in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no listings.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a listing by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.products
            .iter()
            .filter(|product| !product.category.is_empty())
            .filter(|product| seen.insert(product.category.as_str()))
            .map(|product| product.category.clone())
            .collect()
    }

    /// Listings matching a case-insensitive search and an optional category.
    pub fn filter(&self, query: &str, category: Option<&str>) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|product| category.map_or(true, |wanted| product.category == wanted))
            .filter(|product| needle.is_empty() || product_matches(product, &needle))
            .cloned()
            .collect()
    }
}

fn product_matches(product: &Product, needle: &str) -> bool {
    let candidates = [
        product.title.to_lowercase(),
        product.description.to_lowercase(),
        product.category.to_lowercase(),
        product.location.to_lowercase(),
        product.seller.name.to_lowercase(),
    ];
    candidates.iter().any(|value| value.contains(needle))
}

fn validate(products: &[Product]) -> Result<(), CatalogError> {
    let mut ids = HashSet::new();
    for (idx, product) in products.iter().enumerate() {
        if product.id.trim().is_empty() {
            return Err(CatalogError::MissingId(idx));
        }
        if !ids.insert(product.id.as_str()) {
            return Err(CatalogError::DuplicateId(product.id.clone()));
        }
        if product.initial_price == 0 {
            return Err(CatalogError::NonPositivePrice(product.id.clone()));
        }
        if !(0.0..=5.0).contains(&product.seller.rating) {
            return Err(CatalogError::RatingOutOfRange {
                id: product.id.clone(),
                rating: product.seller.rating,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn sample_catalog_is_valid() -> Result<()> {
        let catalog = Catalog::sample();
        assert_eq!(catalog.len(), 6);
        Catalog::new(catalog.products().to_vec())?;
        assert_eq!(
            catalog.get("2").map(|product| product.current_bid),
            Some(Some(320_000))
        );
        Ok(())
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let catalog = Catalog::sample();
        assert_eq!(
            catalog.categories(),
            vec!["전자기기", "게임", "노트북", "가전제품"]
        );
    }

    #[test]
    fn filter_by_query_and_category() {
        let catalog = Catalog::sample();
        let macs = catalog.filter("macbook", None);
        assert_eq!(macs.len(), 1);
        assert_eq!(macs[0].id, "3");

        let electronics = catalog.filter("", Some("전자기기"));
        let ids: Vec<_> = electronics.iter().map(|product| product.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4", "6"]);

        assert!(catalog.filter("macbook", Some("게임")).is_empty());
        assert_eq!(catalog.filter("  ", None).len(), catalog.len());
    }

    #[test]
    fn loads_catalog_from_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[
  {
    "id": "bike",
    "title": "Road bike",
    "seller": { "id": "s9", "name": "rider", "rating": 4.2 },
    "initialPrice": 500000,
    "currentBid": 450000,
    "isAuctionActive": true,
    "location": "Seoul",
    "createdAt": "2024-05-01T09:00:00Z"
  }
]"#,
        )?;

        let catalog = Catalog::from_path(&path)?;
        let bike = catalog.get("bike").expect("bike listing");
        assert_eq!(bike.initial_price, 500_000);
        assert_eq!(bike.listed_price(), 450_000);
        assert!(bike.description.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_invalid_listings() {
        let mut products = Catalog::sample().products().to_vec();
        products[1].id = products[0].id.clone();
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::DuplicateId(id)) if id == "1"
        ));

        let mut products = Catalog::sample().products().to_vec();
        products[2].initial_price = 0;
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::NonPositivePrice(_))
        ));

        let mut products = Catalog::sample().products().to_vec();
        products[0].seller.rating = 5.5;
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::RatingOutOfRange { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Catalog::from_path("/nonexistent/catalog.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }
}
