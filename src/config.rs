/// Namespace of encyclopedia articles
pub const ARTICLE_NAMESPACE: i32 = 0;

/// Namespace of category pages
pub const CATEGORY_NAMESPACE: i32 = 14;

/// Title prefix of category pages, stripped from category table rows
pub const CATEGORY_PREFIX: &str = "Category:";

/// Pseudo-namespace of a `[[Category:...]]` membership link
pub const CATEGORY_LINK_NAMESPACE: &str = "Category";

/// Articles with this title prefix never produce biography rows
pub const LIST_PREFIX: &str = "List of";

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Pages read before a batch is classified on the rayon pool
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Read buffer for the dump, compressed or not
pub const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffer for table and spool writers
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

pub const PAGES_FILE: &str = "pages_parents.tsv";
pub const CATEGORIES_FILE: &str = "categories_parents.tsv";
pub const BIOGRAPHIES_FILE: &str = "biographical_pages.tsv";

/// Separator of multi-valued fields (parent categories)
pub const LIST_SEPARATOR: char = '|';
