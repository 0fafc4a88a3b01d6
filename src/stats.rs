use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during the extraction process
#[derive(Default, Debug)]
pub struct ExtractionStats {
    pub pages_read: AtomicU64,
    pub articles_kept: AtomicU64,
    pub articles_unclassified: AtomicU64,
    pub categories_written: AtomicU64,
    pub biographies_found: AtomicU64,
    pub links_counted: AtomicU64,
    pub pages_ignored: AtomicU64,
    pub infoboxes_found: AtomicU64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_pages(&self) {
        self.pages_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_articles(&self) {
        self.articles_kept.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unclassified(&self) {
        self.articles_unclassified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_categories(&self) {
        self.categories_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_biographies(&self) {
        self.biographies_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_links(&self, count: u64) {
        self.links_counted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_ignored(&self) {
        self.pages_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_infoboxes(&self) {
        self.infoboxes_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages(&self) -> u64 {
        self.pages_read.load(Ordering::Relaxed)
    }

    pub fn articles(&self) -> u64 {
        self.articles_kept.load(Ordering::Relaxed)
    }

    pub fn unclassified(&self) -> u64 {
        self.articles_unclassified.load(Ordering::Relaxed)
    }

    pub fn categories(&self) -> u64 {
        self.categories_written.load(Ordering::Relaxed)
    }

    pub fn biographies(&self) -> u64 {
        self.biographies_found.load(Ordering::Relaxed)
    }

    pub fn links(&self) -> u64 {
        self.links_counted.load(Ordering::Relaxed)
    }

    pub fn ignored(&self) -> u64 {
        self.pages_ignored.load(Ordering::Relaxed)
    }

    pub fn infoboxes(&self) -> u64 {
        self.infoboxes_found.load(Ordering::Relaxed)
    }
}
