use std::{collections::HashMap, fmt, str::FromStr};

use thiserror::Error;

/// Fixed measurement vocabulary. Anything a scraper reports outside this set
/// is rejected at the boundary, never guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Ml,
    L,
    G,
    Kg,
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
}

impl Unit {
    pub fn family(self) -> UnitFamily {
        match self {
            Unit::G | Unit::Kg => UnitFamily::Mass,
            Unit::Ml | Unit::L => UnitFamily::Volume,
            Unit::Unit => UnitFamily::Count,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Ml => "ml",
            Unit::L => "l",
            Unit::G => "g",
            Unit::Kg => "kg",
            Unit::Unit => "unit",
        }
    }
}

impl UnitFamily {
    /// Canonical unit prices are expressed in for this family.
    pub fn reference(self) -> Unit {
        match self {
            UnitFamily::Mass => Unit::Kg,
            UnitFamily::Volume => Unit::L,
            UnitFamily::Count => Unit::Unit,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("unsupported unit: {0}")]
    Unsupported(String),
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ml" => Ok(Unit::Ml),
            "l" => Ok(Unit::L),
            "g" => Ok(Unit::G),
            "kg" => Ok(Unit::Kg),
            "unit" => Ok(Unit::Unit),
            other => Err(UnitError::Unsupported(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("no conversion defined from {from} to {to}")]
    NoConversion { from: Unit, to: Unit },
}

/// Sparse, directional conversion factors: `target_qty = source_qty * factor`.
/// A missing reverse direction stays missing; it is never inferred from the
/// forward entry.
#[derive(Debug, Clone)]
pub struct ConversionTable {
    factors: HashMap<(Unit, Unit), f64>,
}

impl ConversionTable {
    pub fn empty() -> Self {
        Self {
            factors: HashMap::new(),
        }
    }

    pub fn insert(&mut self, from: Unit, to: Unit, factor: f64) {
        self.factors.insert((from, to), factor);
    }

    /// Build a table from the configuration mapping, validating every unit
    /// name against the fixed vocabulary.
    pub fn from_config(map: &HashMap<String, HashMap<String, f64>>) -> Result<Self, UnitError> {
        let mut table = Self::empty();
        for (from, targets) in map {
            let from = from.parse::<Unit>()?;
            for (to, factor) in targets {
                table.insert(from, to.parse::<Unit>()?, *factor);
            }
        }
        Ok(table)
    }

    pub fn factor(&self, from: Unit, to: Unit) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(1.0);
        }
        self.factors
            .get(&(from, to))
            .copied()
            .ok_or(ConversionError::NoConversion { from, to })
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(Unit::Ml, Unit::L, 0.001);
        table.insert(Unit::L, Unit::Ml, 1000.0);
        table.insert(Unit::G, Unit::Kg, 0.001);
        table.insert(Unit::Kg, Unit::G, 1000.0);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vocabulary() {
        assert_eq!("kg".parse::<Unit>(), Ok(Unit::Kg));
        assert_eq!(" ML ".parse::<Unit>(), Ok(Unit::Ml));
        assert_eq!(
            "oz".parse::<Unit>(),
            Err(UnitError::Unsupported("oz".to_string()))
        );
    }

    #[test]
    fn same_unit_is_identity() {
        let table = ConversionTable::default();
        assert_eq!(table.factor(Unit::Kg, Unit::Kg), Ok(1.0));
    }

    #[test]
    fn round_trip_within_tolerance() {
        let table = ConversionTable::default();
        let x = 2.37_f64;
        let there = x * table.factor(Unit::G, Unit::Kg).unwrap();
        let back = there * table.factor(Unit::Kg, Unit::G).unwrap();
        assert!((back - x).abs() < 1e-9);
    }

    #[test]
    fn directions_are_independent() {
        let mut table = ConversionTable::empty();
        table.insert(Unit::Ml, Unit::L, 0.001);
        assert_eq!(table.factor(Unit::Ml, Unit::L), Ok(0.001));
        assert_eq!(
            table.factor(Unit::L, Unit::Ml),
            Err(ConversionError::NoConversion {
                from: Unit::L,
                to: Unit::Ml
            })
        );
    }

    #[test]
    fn config_rejects_unknown_units() {
        let mut map = HashMap::new();
        map.insert(
            "oz".to_string(),
            HashMap::from([("kg".to_string(), 0.0283)]),
        );
        assert!(ConversionTable::from_config(&map).is_err());
    }
}
