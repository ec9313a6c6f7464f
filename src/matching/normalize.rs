use std::collections::HashMap;

use regex::Regex;

/// Size/quantity phrases embedded in product names, Hebrew and Latin unit
/// words alike ("1.5 ק\"ג", "500 ml"). Removed before similarity scoring so
/// package size never pollutes the comparison.
const SIZE_PHRASE: &str =
    r#"(?i)\d+(?:[.,]\d+)?\s*(?:יח['׳]|(?:ק["״]ג|מ["״]ל|גרם|ליטר|יחיד(?:ה|ות)|kg|ml|g|l)\b)"#;

/// Produces the canonical comparison form of a raw product name: brand tokens
/// stripped, size phrases removed, punctuation dropped, whitespace collapsed,
/// lower-cased. Pure and infallible; a name no rule applies to simply comes
/// out trimmed and lower-cased.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    brand_tokens: HashMap<String, Vec<String>>,
    size_phrase: Regex,
}

impl NameNormalizer {
    /// `brand_tokens` maps a chain id to the retailer branding words that
    /// chain prepends or appends to its listings. The caller (the chain's
    /// scraper configuration) owns that vocabulary; the normalizer stays
    /// chain-agnostic.
    pub fn new(brand_tokens: HashMap<String, Vec<String>>) -> Self {
        let size_phrase = Regex::new(SIZE_PHRASE).expect("size phrase pattern is valid");
        Self {
            brand_tokens,
            size_phrase,
        }
    }

    pub fn normalize(&self, raw: &str, chain_id: &str) -> String {
        let mut name = raw.trim().to_lowercase();

        if let Some(tokens) = self.brand_tokens.get(chain_id) {
            for token in tokens {
                let token = token.trim().to_lowercase();
                if token.is_empty() {
                    continue;
                }
                name = strip_anchored(&name, &token);
            }
        }

        let name = self.size_phrase.replace_all(&name, " ");

        // Punctuation becomes a space, runs of spaces collapse.
        let mut out = String::with_capacity(name.len());
        let mut space_pending = false;
        for ch in name.chars() {
            if ch.is_alphanumeric() {
                out.push(ch);
                space_pending = false;
            } else if !space_pending {
                out.push(' ');
                space_pending = true;
            }
        }

        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Remove `token` where it is anchored at the start or end of `name` on a
/// word boundary. Both inputs are already lower-cased.
fn strip_anchored(name: &str, token: &str) -> String {
    let mut name = name.trim();

    if let Some(rest) = name.strip_prefix(token) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            name = rest.trim_start();
        }
    }

    if let Some(rest) = name.strip_suffix(token) {
        if rest.is_empty() || rest.ends_with(char::is_whitespace) {
            name = rest.trim_end();
        }
    }

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> NameNormalizer {
        let mut tokens = HashMap::new();
        tokens.insert("rami_levy".to_string(), vec!["רמי לוי".to_string()]);
        tokens.insert("acme".to_string(), vec!["Acme".to_string()]);
        NameNormalizer::new(tokens)
    }

    #[test]
    fn strips_brand_prefix_and_suffix() {
        let n = normalizer();
        assert_eq!(n.normalize("רמי לוי חלב 3%", "rami_levy"), "חלב 3");
        assert_eq!(n.normalize("Milk 1% ACME", "acme"), "milk 1");
    }

    #[test]
    fn brand_token_inside_a_word_is_kept() {
        let n = normalizer();
        assert_eq!(n.normalize("Acmeville cereal", "acme"), "acmeville cereal");
    }

    #[test]
    fn removes_size_phrases() {
        let n = normalizer();
        assert_eq!(n.normalize("Milk 3% 1.5 l", "acme"), "milk 3");
        assert_eq!(n.normalize("חלב 3% 1 ליטר", "rami_levy"), "חלב 3");
        assert_eq!(n.normalize("קמח 500 גרם", "rami_levy"), "קמח");
        assert_eq!(n.normalize("ביצים 12 יח'", "rami_levy"), "ביצים");
    }

    #[test]
    fn strips_punctuation_and_collapses_whitespace() {
        let n = normalizer();
        assert_eq!(n.normalize("  Corn-flakes!!  (family)  ", "acme"), "corn flakes family");
    }

    #[test]
    fn unknown_chain_keeps_name_intact() {
        let n = normalizer();
        assert_eq!(n.normalize("Plain Yogurt", "no_such_chain"), "plain yogurt");
    }

    #[test]
    fn never_fails_on_degenerate_input() {
        let n = normalizer();
        assert_eq!(n.normalize("", "acme"), "");
        assert_eq!(n.normalize("!!!", "acme"), "");
    }
}
