//! Catalogue enumerations and price ranges.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error returned when a category string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("category must be one of: men, kids, fabric")]
pub struct CategoryError;

/// Top-level product category.
///
/// Stored as plain text in `products.category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Men,
    Kids,
    Fabric,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 3] = [Self::Men, Self::Kids, Self::Fabric];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Kids => "kids",
            Self::Fabric => "fabric",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(CategoryError)
    }
}

/// Error returned when a customization service type is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("service type must be one of: custom-tailoring, fabric-selection, design-consultation, alterations")]
pub struct ServiceTypeError;

/// Kind of bespoke work requested through the customization form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    CustomTailoring,
    FabricSelection,
    DesignConsultation,
    Alterations,
}

impl ServiceType {
    pub const ALL: [Self; 4] = [
        Self::CustomTailoring,
        Self::FabricSelection,
        Self::DesignConsultation,
        Self::Alterations,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomTailoring => "custom-tailoring",
            Self::FabricSelection => "fabric-selection",
            Self::DesignConsultation => "design-consultation",
            Self::Alterations => "alterations",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = ServiceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(ServiceTypeError)
    }
}

/// Lower and upper bound for products sold at a variable price
/// (made-to-measure pieces, fabric by length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
}

impl PriceRange {
    /// Builds a range only when both bounds are known.
    #[must_use]
    pub const fn from_bounds(min: Option<Decimal>, max: Option<Decimal>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Self { min, max }),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("men".parse::<Category>(), Ok(Category::Men));
        assert_eq!("fabric".parse::<Category>(), Ok(Category::Fabric));
        assert_eq!("Men".parse::<Category>(), Err(CategoryError));
        assert_eq!("women".parse::<Category>(), Err(CategoryError));
    }

    #[test]
    fn test_service_type_kebab_case() {
        let parsed: ServiceType = serde_json::from_str("\"design-consultation\"").unwrap();
        assert_eq!(parsed, ServiceType::DesignConsultation);
        assert_eq!(
            "alterations".parse::<ServiceType>(),
            Ok(ServiceType::Alterations)
        );
        assert!("repairs".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_price_range_requires_both_bounds() {
        let min = Decimal::new(150_000, 2);
        let max = Decimal::new(450_000, 2);
        assert!(PriceRange::from_bounds(Some(min), None).is_none());
        assert!(PriceRange::from_bounds(None, Some(max)).is_none());

        let range = PriceRange::from_bounds(Some(min), Some(max)).unwrap();
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json, serde_json::json!({"min": 1500.0, "max": 4500.0}));
    }
}
