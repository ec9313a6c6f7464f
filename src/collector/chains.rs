use std::sync::Arc;

use anyhow::{anyhow, Context};
use url::Url;

use crate::config::ChainConfig;
use crate::matching::units::Unit;

use super::{size::extract_size, ChainInfo, PriceScraper, RawListing};

/// Generic scraper for chains that publish their price list as an HTML table
/// of `product-row` rows with `product-name` / `product-price` cells (and an
/// optional `product-discount` cell). Chains with bespoke formats get their
/// own `PriceScraper` impl; this covers the common case and keeps the
/// pipeline exercised end to end.
pub struct ListingTableScraper {
    config: ChainConfig,
}

impl ListingTableScraper {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }
}

pub fn build_scrapers(chains: &[ChainConfig]) -> anyhow::Result<Vec<Arc<dyn PriceScraper>>> {
    chains
        .iter()
        .cloned()
        .map(|chain| {
            Url::parse(&chain.listing_url)
                .with_context(|| format!("invalid listing url for chain {}", chain.chain_id))?;
            Ok(Arc::new(ListingTableScraper::new(chain)) as Arc<dyn PriceScraper>)
        })
        .collect()
}

impl PriceScraper for ListingTableScraper {
    fn chain(&self) -> ChainInfo {
        ChainInfo {
            chain_id: self.config.chain_id.clone(),
            chain_name: self.config.name.clone(),
            branch_id: self.config.branch_id.clone(),
            branch_name: self.config.branch_name.clone(),
            address: self.config.address.clone(),
        }
    }

    fn listing_url(&self) -> &str {
        &self.config.listing_url
    }

    fn parse(&self, body: &str) -> anyhow::Result<Vec<RawListing>> {
        let mut listings = Vec::new();

        for row in split_on_class(body, "product-row") {
            let Some(name) = cell_text(row, "product-name") else {
                continue;
            };
            let Some(price_text) = cell_text(row, "product-price") else {
                continue;
            };
            let Ok(price) = parse_price(&price_text) else {
                tracing::warn!(chain_id = %self.config.chain_id, name = %name, price = %price_text, "unparseable price cell");
                continue;
            };

            let discount_price = cell_text(row, "product-discount")
                .and_then(|text| parse_price(&text).ok());

            let (size, unit) = extract_size(&name).unwrap_or((1.0, Unit::Unit));

            listings.push(RawListing {
                name,
                size,
                unit: unit.as_str().to_string(),
                price,
                original_price: discount_price.map(|_| price),
                discount_price,
                discount_description: cell_text(row, "discount-description"),
            });
        }

        if listings.is_empty() && !body.contains("product-row") {
            return Err(anyhow!(
                "listing page for {} has no product rows",
                self.config.chain_id
            ));
        }

        Ok(listings)
    }
}

/// Slices of `body` starting at each occurrence of `class`, ending at the
/// next occurrence. Crude, but price pages are machine-generated and regular;
/// no full HTML parse needed.
fn split_on_class<'a>(body: &'a str, class: &str) -> Vec<&'a str> {
    let starts: Vec<usize> = body.match_indices(class).map(|(i, _)| i).collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(body.len());
            &body[start..end]
        })
        .collect()
}

/// Text content of the first element carrying `class` in `fragment`.
fn cell_text(fragment: &str, class: &str) -> Option<String> {
    let at = fragment.find(class)?;
    let rest = &fragment[at..];
    let start = rest.find('>')? + 1;
    let end = rest[start..].find('<')? + start;
    let text = rest[start..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_price(text: &str) -> anyhow::Result<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| anyhow!("unparseable price: {text}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> ListingTableScraper {
        ListingTableScraper::new(ChainConfig {
            chain_id: "rami_levy".to_string(),
            name: "רמי לוי".to_string(),
            listing_url: "https://example.test/prices".to_string(),
            branch_id: String::new(),
            branch_name: None,
            address: None,
        })
    }

    #[test]
    fn parses_rows() {
        let html = r#"
            <table>
              <tr class="product-row">
                <td class="product-name">חלב טרי 1 ליטר</td>
                <td class="product-price">₪6.90</td>
              </tr>
              <tr class="product-row">
                <td class="product-name">קמח 500 גרם</td>
                <td class="product-price">4.50</td>
                <td class="product-discount">3.90</td>
              </tr>
            </table>
        "#;

        let listings = scraper().parse(html).unwrap();
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].name, "חלב טרי 1 ליטר");
        assert!((listings[0].price - 6.9).abs() < 1e-9);
        assert_eq!(listings[0].size, 1.0);
        assert_eq!(listings[0].unit, "l");
        assert!(listings[0].discount_price.is_none());

        assert_eq!(listings[1].unit, "g");
        assert_eq!(listings[1].size, 500.0);
        assert_eq!(listings[1].discount_price, Some(3.9));
        assert_eq!(listings[1].original_price, Some(4.5));
    }

    #[test]
    fn sizeless_listing_defaults_to_one_unit() {
        let html = r#"
            <tr class="product-row">
              <td class="product-name">מלפפון</td>
              <td class="product-price">1.20</td>
            </tr>
        "#;
        let listings = scraper().parse(html).unwrap();
        assert_eq!(listings[0].size, 1.0);
        assert_eq!(listings[0].unit, "unit");
    }

    #[test]
    fn invalid_listing_url_is_rejected() {
        let mut chain = scraper().config;
        chain.listing_url = "not a url".to_string();
        assert!(build_scrapers(&[chain]).is_err());
    }

    #[test]
    fn page_without_rows_is_an_error() {
        assert!(scraper().parse("<html><body>maintenance</body></html>").is_err());
    }

    #[test]
    fn malformed_price_row_is_skipped() {
        let html = r#"
            <tr class="product-row">
              <td class="product-name">חלב</td>
              <td class="product-price">n/a</td>
            </tr>
            <tr class="product-row">
              <td class="product-name">לחם</td>
              <td class="product-price">7.00</td>
            </tr>
        "#;
        let listings = scraper().parse(html).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "לחם");
    }
}
