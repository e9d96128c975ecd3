use std::ffi::OsStr;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::download::ImageDownloader;
use crate::element_finder::ElementFinder;
use crate::extractors::{self, clean_price, extract_discount};
use crate::export;
use crate::models::{MAX_IMAGES, ProductRecord, SelectorStrategy};
use crate::utils::error::{AppError, Result};

// DOM map for the storefront catalog. These selectors are tied to the
// site's current theme and have to move with it.
const LISTING_GRID: &str = "div.product-grid";
const LISTING_LINKS: &str = "div.product-grid a.product-image";
const PAGER_ITEMS: &str = "ul.pagination li a";
const GALLERY_IMAGES: &str = "div.product-gallery img";
const PRODUCT_NAME: &str = "h1.product-title";
const PRODUCT_ID: &str = "span.product-sku";
const PRODUCT_PRICE: &str = "span.price";
const PRODUCT_DISCOUNT: &str = "span.discount-label";
const PRODUCT_COLOR: &str = "span.color-code";

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Poll interval while waiting for a clicked pager to replace the
/// listing content.
const REFRESH_POLL: Duration = Duration::from_millis(250);

/// Which pager entries are real page links.
///
/// The storefront renders its previous/next arrows as the first and
/// last entries of the pager, so only the entries between them are
/// clicked. A site-schema change lands here, not in loop bounds.
#[derive(Debug, Clone, Copy)]
pub struct PagerSkipPolicy {
    pub leading: usize,
    pub trailing: usize,
}

impl PagerSkipPolicy {
    /// Indexes of the clickable page entries for a pager of `total`
    /// entries; empty when the pager is nothing but arrows.
    pub fn page_range(&self, total: usize) -> Range<usize> {
        if total <= self.leading + self.trailing {
            0..0
        } else {
            self.leading..total - self.trailing
        }
    }
}

pub const PAGER_SKIP: PagerSkipPolicy = PagerSkipPolicy {
    leading: 1,
    trailing: 1,
};

/// Counts and outputs of one full run, for the final log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub links: usize,
    pub products: usize,
    pub images_saved: usize,
    pub images_failed: usize,
    pub csv_path: PathBuf,
}

/// One browser session plus everything the pipeline stages need.
///
/// Strictly sequential: load target, collect links across pagination,
/// extract each product, download its images, export the catalog.
pub struct ExtractionSession {
    config: AppConfig,
    // Keeps the Chrome process alive for the lifetime of the session.
    _browser: Browser,
    tab: Arc<Tab>,
    finder: ElementFinder,
    downloader: ImageDownloader,
}

impl ExtractionSession {
    pub fn new(config: AppConfig) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("failed to build launch options: {e}")))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("failed to launch browser: {e}")))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("failed to open tab: {e}")))?;
        tab.set_user_agent(USER_AGENT, None, None)
            .map_err(|e| AppError::Browser(format!("failed to set user agent: {e}")))?;

        let finder = ElementFinder::new(config.timeout());
        let downloader = ImageDownloader::new(&config)?;

        Ok(Self {
            config,
            _browser: browser,
            tab,
            finder,
            downloader,
        })
    }

    /// Run the whole pipeline and return its summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();

        self.load_target();

        let links = self.collect_links().await;
        info!(count = links.len(), "collected product links");

        let mut records = Vec::with_capacity(links.len());
        for link in &links {
            records.push(self.extract_product(link));
        }

        let mut images_saved = 0;
        let mut images_failed = 0;
        for record in &mut records {
            let outcome = self.downloader.fetch_all(record).await;
            images_saved += outcome.saved;
            images_failed += outcome.failed;
        }

        let csv_path = export::export_catalog(&self.config.csv_dir(), &records)?;

        info!(
            products = records.len(),
            images_saved,
            images_failed,
            duration = ?started.elapsed(),
            "run complete"
        );

        Ok(RunSummary {
            links: links.len(),
            products: records.len(),
            images_saved,
            images_failed,
            csv_path,
        })
    }

    /// Navigate to the catalog's entry page. Failure is logged and
    /// non-fatal: downstream lookups fail on their own and degrade.
    pub fn load_target(&self) {
        let url = self.config.parameters.target_url.clone();
        info!(url = %url, "loading catalog");
        if let Err(e) = self.navigate(&url) {
            warn!(url = %url, error = %e, "catalog failed to load; lookups will likely come up empty");
        }
    }

    /// Walk the pager and return every product-detail link in page
    /// order, item order preserved within each page.
    pub async fn collect_links(&self) -> Vec<String> {
        let mut links = self.listing_links();

        let Some(pagers) = self
            .finder
            .find_all(&self.tab, SelectorStrategy::Css, PAGER_ITEMS)
        else {
            debug!("no pager found; treating catalog as a single page");
            return links;
        };

        let pages = PAGER_SKIP.page_range(pagers.len());
        debug!(entries = pagers.len(), pages = pages.len(), "pager located");

        for index in pages {
            // Clicking replaces the listing, so the pager has to be
            // re-found each round; the stale handles are useless.
            let Some(pagers) = self
                .finder
                .find_all(&self.tab, SelectorStrategy::Css, PAGER_ITEMS)
            else {
                warn!(index, "pager disappeared mid-walk");
                break;
            };
            let Some(pager) = pagers.get(index) else {
                warn!(index, entries = pagers.len(), "pager entry out of range");
                break;
            };

            let marker = self
                .finder
                .find(&self.tab, SelectorStrategy::Css, LISTING_GRID);

            if let Err(e) = pager.click() {
                warn!(index, error = %e, "pager click failed; skipping page");
                continue;
            }

            self.wait_for_listing_refresh(marker.as_ref()).await;
            links.extend(self.listing_links());
        }

        links
    }

    /// Scrape one product detail page into a record. Every field has
    /// its own empty default; a failed lookup degrades only itself.
    pub fn extract_product(&self, link: &str) -> ProductRecord {
        info!(url = %link, "extracting product");
        if let Err(e) = self.navigate(link) {
            warn!(url = %link, error = %e, "product page failed to load");
        }

        // Every field falls back to its own empty default; one failed
        // lookup never bleeds into a neighbouring column.
        let record = ProductRecord {
            images: self.gallery_sources(),
            shoe_name: self.field_text(PRODUCT_NAME),
            shoe_id: self.field_text(PRODUCT_ID),
            price: clean_price(&self.field_text(PRODUCT_PRICE)),
            discount: extract_discount(&self.field_text(PRODUCT_DISCOUNT)).unwrap_or_default(),
            color_code: self.field_text(PRODUCT_COLOR),
        };

        if record.is_empty() {
            warn!(url = %link, "no fields extracted");
        }
        record
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| AppError::Navigation(e.to_string()))
    }

    /// Links of the currently shown listing page.
    fn listing_links(&self) -> Vec<String> {
        if self
            .finder
            .find(&self.tab, SelectorStrategy::Css, LISTING_GRID)
            .is_none()
        {
            return Vec::new();
        }

        match self.tab.get_content() {
            Ok(html) => extractors::listing_links(&html, LISTING_LINKS),
            Err(e) => {
                warn!(error = %e, "failed to read listing content");
                Vec::new()
            }
        }
    }

    /// Gallery image URLs of the current product page, capped at
    /// [`MAX_IMAGES`].
    fn gallery_sources(&self) -> Vec<String> {
        let Some(elements) = self
            .finder
            .find_all(&self.tab, SelectorStrategy::Css, GALLERY_IMAGES)
        else {
            return Vec::new();
        };

        elements
            .iter()
            .take(MAX_IMAGES)
            .filter_map(|element| element.get_content().ok())
            .filter_map(|fragment| extractors::image_source(&fragment))
            .collect()
    }

    /// Visible text of a single looked-up field, empty when the
    /// element never showed up.
    fn field_text(&self, selector: &str) -> String {
        self.finder
            .find(&self.tab, SelectorStrategy::Css, selector)
            .and_then(|element| element.get_inner_text().ok())
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    /// Block until the pre-click listing container goes stale (the
    /// pager swapped the content in) or the configured timeout passes.
    async fn wait_for_listing_refresh(&self, previous: Option<&Element<'_>>) {
        let Some(previous) = previous else {
            // No marker to key off; give the page one poll interval.
            tokio::time::sleep(REFRESH_POLL).await;
            return;
        };

        let deadline = Instant::now() + self.config.timeout();
        while Instant::now() < deadline {
            if previous.get_description().is_err() {
                debug!("listing replaced");
                return;
            }
            tokio::time::sleep(REFRESH_POLL).await;
        }

        warn!("listing did not refresh within timeout; reading current content anyway");
    }

    /// Release the tab. The Chrome process itself shuts down when the
    /// session drops.
    pub fn close(self) {
        if let Err(e) = self.tab.close(true) {
            debug!(error = %e, "tab close failed");
        }
    }
}
