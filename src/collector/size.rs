use std::sync::OnceLock;

use regex::Regex;

use crate::matching::units::Unit;

// Hebrew unit words as they appear on retailer price pages, plus the Latin
// forms. Latin single letters need a word boundary so "500 glue" is not read
// as 500 g.
const SIZE_PATTERN: &str = r#"(?i)(\d+(?:[.,]\d+)?)\s*(ק["״]ג|מ["״]ל|גרם|ליטר|יחידות|יחידה|יח['׳]|(?:kg|ml|g|l)\b)"#;

static SIZE_RE: OnceLock<Regex> = OnceLock::new();

/// Pull the first size/unit phrase out of a listing name. Returns the value
/// in the unit as written ("500 גרם" is 500 g, not 0.5 kg); normalization to
/// reference units is the conversion table's job. `None` when the name
/// carries no size phrase — callers default to one count unit.
pub fn extract_size(name: &str) -> Option<(f64, Unit)> {
    let re = SIZE_RE.get_or_init(|| Regex::new(SIZE_PATTERN).expect("size pattern is valid"));
    let caps = re.captures(name)?;

    let value: f64 = caps[1].replace(',', ".").parse().ok()?;
    let unit_word = &caps[2];

    let unit = if unit_word.starts_with('ק') {
        Unit::Kg
    } else if unit_word.starts_with('מ') {
        Unit::Ml
    } else if unit_word.starts_with("גרם") {
        Unit::G
    } else if unit_word.starts_with("ליטר") {
        Unit::L
    } else if unit_word.starts_with("יח") {
        Unit::Unit
    } else {
        match unit_word.to_ascii_lowercase().as_str() {
            "kg" => Unit::Kg,
            "ml" => Unit::Ml,
            "g" => Unit::G,
            "l" => Unit::L,
            _ => return None,
        }
    };

    Some((value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hebrew_units() {
        assert_eq!(extract_size("חלב טרי 1 ליטר"), Some((1.0, Unit::L)));
        assert_eq!(extract_size("קמח 500 גרם"), Some((500.0, Unit::G)));
        assert_eq!(extract_size("אורז 1.5 ק\"ג"), Some((1.5, Unit::Kg)));
        assert_eq!(extract_size("תרסיס 750 מ\"ל"), Some((750.0, Unit::Ml)));
        assert_eq!(extract_size("ביצים 12 יחידות"), Some((12.0, Unit::Unit)));
    }

    #[test]
    fn latin_units() {
        assert_eq!(extract_size("Milk 3% 1.5 l"), Some((1.5, Unit::L)));
        assert_eq!(extract_size("Rice 2 kg"), Some((2.0, Unit::Kg)));
        assert_eq!(extract_size("Juice 330ml"), Some((330.0, Unit::Ml)));
    }

    #[test]
    fn decimal_comma() {
        assert_eq!(extract_size("שמן 1,5 ליטר"), Some((1.5, Unit::L)));
    }

    #[test]
    fn boundary_protects_single_letters() {
        assert_eq!(extract_size("500 glue sticks"), None);
    }

    #[test]
    fn no_size_phrase() {
        assert_eq!(extract_size("מלפפון"), None);
        assert_eq!(extract_size(""), None);
    }
}
