pub mod chains;
pub mod size;

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use chardetng::EncodingDetector;
use reqwest::Client;
use tokio::{
    task::JoinSet,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    config::{CollectorConfig, MatchingConfig},
    matching::{engine::MatchEngine, normalize::NameNormalizer, store::PgMatchStore},
    repo::{
        prices::{self, NewPrice},
        products::{self, NewProduct},
        supermarkets::{self, SupermarketUpsert},
    },
};

/// Chain/branch identity a scraper reports for its listings.
#[derive(Debug, Clone)]
pub struct ChainInfo {
    pub chain_id: String,
    pub chain_name: String,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub address: Option<String>,
}

/// One product listing parsed from a retailer price page. `unit` is kept as
/// reported; anything outside the fixed vocabulary surfaces later as
/// `UnsupportedUnit` when a price comparison touches it.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub name: String,
    pub size: f64,
    pub unit: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_price: Option<f64>,
    pub discount_description: Option<String>,
}

/// Capability interface every retailer scraper satisfies. The pipeline and
/// the core only ever see this trait, never a concrete chain type.
pub trait PriceScraper: Send + Sync {
    fn chain(&self) -> ChainInfo;
    fn listing_url(&self) -> &str;
    fn parse(&self, body: &str) -> anyhow::Result<Vec<RawListing>>;
}

pub fn spawn(
    pool: sqlx::PgPool,
    collector_config: CollectorConfig,
    matching_config: MatchingConfig,
    scrapers: Vec<Arc<dyn PriceScraper>>,
) -> anyhow::Result<()> {
    let collector = Collector::new(pool, collector_config, matching_config, scrapers)?;
    tokio::spawn(async move {
        if let Err(err) = collector.run().await {
            tracing::error!(error = ?err, "collector stopped");
        }
    });
    Ok(())
}

struct Collector {
    pool: sqlx::PgPool,
    client: Client,
    config: CollectorConfig,
    normalizer: Arc<NameNormalizer>,
    engine: MatchEngine,
    scrapers: Vec<Arc<dyn PriceScraper>>,
}

impl Collector {
    fn new(
        pool: sqlx::PgPool,
        mut config: CollectorConfig,
        matching_config: MatchingConfig,
        scrapers: Vec<Arc<dyn PriceScraper>>,
    ) -> anyhow::Result<Self> {
        if config.interval_secs == 0 {
            config.interval_secs = 60;
        }
        if config.concurrency == 0 {
            config.concurrency = 1;
        }
        if config.request_timeout_secs == 0 {
            config.request_timeout_secs = 10;
        }

        let client = Client::builder()
            .user_agent("PricewatchCollector/0.1")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let normalizer = Arc::new(NameNormalizer::new(matching_config.brand_strip_tokens.clone()));
        let engine = MatchEngine::new(
            matching_config.similarity_threshold,
            matching_config.max_matches.map(|n| n as usize),
        );

        Ok(Self {
            pool,
            client,
            config,
            normalizer,
            engine,
            scrapers,
        })
    }

    async fn run(self) -> anyhow::Result<()> {
        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // immediate first run

        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                warn!(error = ?err, "collection round failed");
            }
        }
    }

    /// One collection round: every chain is fetched, parsed and persisted,
    /// then a single match run reconciles the refreshed catalog.
    async fn run_once(&self) -> anyhow::Result<()> {
        if self.scrapers.is_empty() {
            debug!("no scrapers registered, skipping round");
            return Ok(());
        }

        info!(chains = self.scrapers.len(), "starting collection round");

        let concurrency = self.config.concurrency as usize;
        let mut set = JoinSet::new();

        for scraper in &self.scrapers {
            let pool = self.pool.clone();
            let client = self.client.clone();
            let normalizer = self.normalizer.clone();
            let config = self.config.clone();
            let scraper = scraper.clone();

            set.spawn(async move {
                let chain = scraper.chain();
                if let Err(err) = collect_chain(pool, client, normalizer, config, scraper).await {
                    warn!(chain_id = %chain.chain_id, error = ?err, "failed to collect chain");
                }
            });

            if set.len() >= concurrency {
                if let Some(res) = set.join_next().await {
                    let _ = res;
                }
            }
        }

        while set.join_next().await.is_some() {}

        let store = PgMatchStore::new(self.pool.clone());
        let report = self.engine.match_all(&store).await?;
        info!(
            created = report.created_count(),
            duplicates = report.duplicates,
            skipped = report.skipped.len(),
            "collection round finished"
        );

        Ok(())
    }
}

async fn collect_chain(
    pool: sqlx::PgPool,
    client: Client,
    normalizer: Arc<NameNormalizer>,
    config: CollectorConfig,
    scraper: Arc<dyn PriceScraper>,
) -> anyhow::Result<()> {
    let chain = scraper.chain();
    let body = fetch_listing(
        &client,
        scraper.listing_url(),
        config.max_retries,
        Duration::from_secs(config.retry_delay_secs),
    )
    .await?;

    let listings = scraper
        .parse(&body)
        .with_context(|| format!("failed to parse listing for {}", chain.chain_id))?;
    if listings.is_empty() {
        debug!(chain_id = %chain.chain_id, "no listings parsed");
        return Ok(());
    }

    let supermarket_id = supermarkets::upsert_supermarket(
        &pool,
        SupermarketUpsert {
            chain_id: chain.chain_id.clone(),
            name: chain.chain_name.clone(),
            branch_id: chain.branch_id.clone(),
            branch_name: chain.branch_name.clone(),
            address: chain.address.clone(),
        },
    )
    .await?;

    let count = listings.len();
    for listing in listings {
        let canonical_name = normalizer.normalize(&listing.name, &chain.chain_id);
        let product_id = products::upsert_product(
            &pool,
            NewProduct {
                name: listing.name,
                canonical_name,
                size: listing.size,
                unit: listing.unit,
            },
        )
        .await?;

        prices::insert_price(
            &pool,
            NewPrice {
                product_id,
                supermarket_id,
                price: listing.price,
                original_price: listing.original_price,
                discount_price: listing.discount_price,
                discount_description: listing.discount_description,
            },
        )
        .await?;
    }

    info!(chain_id = %chain.chain_id, count, "persisted listings");
    Ok(())
}

async fn fetch_listing(
    client: &Client,
    url: &str,
    max_retries: u32,
    retry_delay: Duration,
) -> anyhow::Result<String> {
    let mut attempt = 0u32;
    loop {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                let bytes = response.bytes().await?;
                return Ok(decode_body(&bytes));
            }
            Ok(response) => {
                let status = response.status();
                if attempt >= max_retries {
                    return Err(anyhow!("unexpected status {status} fetching {url}"));
                }
                warn!(%url, status = status.as_u16(), attempt, "listing fetch failed, retrying");
            }
            Err(err) => {
                if attempt >= max_retries {
                    return Err(anyhow::Error::from(err)
                        .context(format!("failed to fetch {url}")));
                }
                warn!(%url, error = ?err, attempt, "listing fetch failed, retrying");
            }
        }
        attempt += 1;
        tokio::time::sleep(retry_delay).await;
    }
}

/// Retailer pages are frequently windows-1255 rather than UTF-8; sniff the
/// encoding instead of assuming.
fn decode_body(bytes: &[u8]) -> String {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}
