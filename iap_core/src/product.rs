//! Product metadata as reported by the platform catalog.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Opaque identifier of a purchasable item, e.g. `com.example.remove_ads`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductIdentifier(String);

impl ProductIdentifier {
    /// Creates a new identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ProductIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A product returned by the platform catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// The product identifier
    pub identifier: ProductIdentifier,
    /// Localized title
    pub title: String,
    /// Localized description
    pub description: String,
    /// Price in millionths of the currency unit
    pub price_micros: i64,
    /// ISO 4217 currency code
    pub currency_code: String,
}

impl Product {
    /// Creates a product with an empty description.
    pub fn new(
        identifier: impl Into<ProductIdentifier>,
        title: impl Into<String>,
        price_micros: i64,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            description: String::new(),
            price_micros,
            currency_code: currency_code.into(),
        }
    }

    /// Sets the localized description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The answer to a catalog request.
///
/// Identifiers the platform did not recognise are reported in
/// `invalid_identifiers`; they are informational and do not fail the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResult {
    /// Resolved products, unique by identifier, in platform order
    pub products: Vec<Product>,
    /// Requested identifiers the platform rejected
    pub invalid_identifiers: BTreeSet<ProductIdentifier>,
}

impl CatalogResult {
    /// Builds a result, keeping the first product seen for each identifier.
    pub fn new(
        products: impl IntoIterator<Item = Product>,
        invalid_identifiers: impl IntoIterator<Item = ProductIdentifier>,
    ) -> Self {
        let mut seen = HashSet::new();
        let products = products
            .into_iter()
            .filter(|p| seen.insert(p.identifier.clone()))
            .collect();
        Self {
            products,
            invalid_identifiers: invalid_identifiers.into_iter().collect(),
        }
    }

    /// Finds a resolved product by identifier.
    pub fn product(&self, identifier: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.identifier.as_str() == identifier)
    }

    /// Returns `true` if neither products nor invalid identifiers were reported.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.invalid_identifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, title: &str) -> Product {
        Product::new(id, title, 990_000, "USD")
    }

    #[test]
    fn catalog_result_keeps_first_duplicate() {
        let result = CatalogResult::new(
            vec![
                product("gems.small", "Small"),
                product("gems.large", "Large"),
                product("gems.small", "Small again"),
            ],
            vec![],
        );

        assert_eq!(result.products.len(), 2);
        assert_eq!(result.products[0].title, "Small");
        assert_eq!(result.products[1].identifier.as_str(), "gems.large");
    }

    #[test]
    fn catalog_result_lookup_by_identifier() {
        let result = CatalogResult::new(
            vec![product("gems.small", "Small")],
            vec!["gems.unknown".into()],
        );

        assert!(result.product("gems.small").is_some());
        assert!(result.product("gems.unknown").is_none());
        assert!(result.invalid_identifiers.contains("gems.unknown"));
        assert!(!result.is_empty());
    }

    #[test]
    fn product_identifier_serializes_as_plain_string() {
        let id = ProductIdentifier::new("remove_ads");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"remove_ads\"");
        let back: ProductIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
