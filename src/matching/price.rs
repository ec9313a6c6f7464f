use std::str::FromStr;

use thiserror::Error;

use super::units::{ConversionTable, Unit, UnitError};

/// Expected, per-pair outcomes of price normalization. These are returned,
/// not panicked: a heterogeneous catalog produces them constantly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("unsupported unit: {0}")]
    UnsupportedUnit(String),
    /// Size or conversion data is unusable; skip the comparison rather than
    /// defaulting to a wrong number.
    #[error("price cannot be normalized")]
    Indeterminate,
    /// The two prices measure different unit families (e.g. mass vs count).
    #[error("prices are not comparable across unit families")]
    Incomparable,
}

impl From<UnitError> for PriceError {
    fn from(err: UnitError) -> Self {
        let UnitError::Unsupported(unit) = err;
        PriceError::UnsupportedUnit(unit)
    }
}

/// A price expressed per one reference unit of its family (kg, l or unit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPrice {
    pub value: f64,
    pub reference: Unit,
}

/// Converts listed prices into price-per-reference-unit so packages of
/// different sizes and units compare fairly.
#[derive(Debug, Clone)]
pub struct PriceNormalizer {
    table: ConversionTable,
}

impl PriceNormalizer {
    pub fn new(table: ConversionTable) -> Self {
        Self { table }
    }

    pub fn per_reference_unit(
        &self,
        price: f64,
        size: f64,
        unit: Unit,
    ) -> Result<UnitPrice, PriceError> {
        if !size.is_finite() || size <= 0.0 || !price.is_finite() {
            return Err(PriceError::Indeterminate);
        }

        let reference = unit.family().reference();
        let factor = self
            .table
            .factor(unit, reference)
            .map_err(|_| PriceError::Indeterminate)?;

        // price/size is the cost of one `unit`; one `unit` is `factor`
        // reference units.
        Ok(UnitPrice {
            value: (price / size) / factor,
            reference,
        })
    }

    /// Same as [`per_reference_unit`](Self::per_reference_unit) but starting
    /// from the unit string as persisted on the product row.
    pub fn per_reference_unit_raw(
        &self,
        price: f64,
        size: f64,
        unit: &str,
    ) -> Result<UnitPrice, PriceError> {
        let unit = Unit::from_str(unit)?;
        self.per_reference_unit(price, size, unit)
    }

    /// Ratio `a / b` of two normalized prices. Different unit families are
    /// explicitly not comparable.
    pub fn compare(&self, a: UnitPrice, b: UnitPrice) -> Result<f64, PriceError> {
        if a.reference.family() != b.reference.family() {
            return Err(PriceError::Incomparable);
        }
        if b.value == 0.0 {
            return Err(PriceError::Indeterminate);
        }
        Ok(a.value / b.value)
    }
}

impl Default for PriceNormalizer {
    fn default() -> Self {
        Self::new(ConversionTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grams_normalize_to_per_kilogram() {
        let normalizer = PriceNormalizer::default();
        // 500 g for 10.0 -> 20.0 per kg.
        let unit_price = normalizer
            .per_reference_unit(10.0, 500.0, Unit::G)
            .unwrap();
        assert_eq!(unit_price.reference, Unit::Kg);
        assert!((unit_price.value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn milliliters_normalize_to_per_liter() {
        let normalizer = PriceNormalizer::default();
        let unit_price = normalizer
            .per_reference_unit(6.0, 750.0, Unit::Ml)
            .unwrap();
        assert_eq!(unit_price.reference, Unit::L);
        assert!((unit_price.value - 8.0).abs() < 1e-9);
    }

    #[test]
    fn count_items_stay_per_unit() {
        let normalizer = PriceNormalizer::default();
        let unit_price = normalizer
            .per_reference_unit(24.0, 12.0, Unit::Unit)
            .unwrap();
        assert_eq!(unit_price.reference, Unit::Unit);
        assert!((unit_price.value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_size_is_indeterminate() {
        let normalizer = PriceNormalizer::default();
        assert_eq!(
            normalizer.per_reference_unit(10.0, 0.0, Unit::Kg),
            Err(PriceError::Indeterminate)
        );
        assert_eq!(
            normalizer.per_reference_unit(10.0, -1.0, Unit::G),
            Err(PriceError::Indeterminate)
        );
    }

    #[test]
    fn unknown_unit_string_is_unsupported() {
        let normalizer = PriceNormalizer::default();
        assert_eq!(
            normalizer.per_reference_unit_raw(10.0, 1.0, "oz"),
            Err(PriceError::UnsupportedUnit("oz".to_string()))
        );
    }

    #[test]
    fn missing_conversion_is_indeterminate() {
        let normalizer = PriceNormalizer::new(ConversionTable::empty());
        assert_eq!(
            normalizer.per_reference_unit(10.0, 2.0, Unit::G),
            Err(PriceError::Indeterminate)
        );
    }

    #[test]
    fn cross_family_comparison_is_rejected() {
        let normalizer = PriceNormalizer::default();
        let mass = normalizer.per_reference_unit(10.0, 1.0, Unit::Kg).unwrap();
        let count = normalizer
            .per_reference_unit(5.0, 1.0, Unit::Unit)
            .unwrap();
        assert_eq!(normalizer.compare(mass, count), Err(PriceError::Incomparable));
    }

    #[test]
    fn same_family_comparison_yields_ratio() {
        let normalizer = PriceNormalizer::default();
        let a = normalizer.per_reference_unit(20.0, 1.0, Unit::Kg).unwrap();
        let b = normalizer.per_reference_unit(10.0, 1000.0, Unit::G).unwrap();
        let ratio = normalizer.compare(a, b).unwrap();
        assert!((ratio - 2.0).abs() < 1e-9);
    }
}
