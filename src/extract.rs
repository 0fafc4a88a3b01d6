use crate::config::{
    ARTICLE_NAMESPACE, BIOGRAPHIES_FILE, CATEGORIES_FILE, CATEGORY_NAMESPACE, CATEGORY_PREFIX,
    DEFAULT_BATCH_SIZE, LIST_PREFIX, PAGES_FILE, PROGRESS_INTERVAL, WRITE_BUFFER_SIZE,
};
use crate::index::LinkCounts;
use crate::infobox::Infobox;
use crate::lifespan::Lifespan;
use crate::models::{
    BiographicalRow, CategoryRow, LinkCountRow, PageRecord, PageRow, PendingArticle,
};
use crate::output::{persist_all, persist_file, temp_file_beside, RowSink, StagedTable, TableFile};
use crate::parser::WikiReader;
use crate::spool::Spool;
use crate::stats::ExtractionStats;
use anyhow::{Context, Result};
use indexmap::IndexSet;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Final locations of the output tables.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub pages: PathBuf,
    pub categories: PathBuf,
    pub biographies: PathBuf,
    /// Optional `title \t count` table of every linked title, sorted by title
    pub link_counts: Option<PathBuf>,
}

impl OutputPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            pages: dir.join(PAGES_FILE),
            categories: dir.join(CATEGORIES_FILE),
            biographies: dir.join(BIOGRAPHIES_FILE),
            link_counts: None,
        }
    }

    pub fn with_link_counts(mut self, path: impl Into<PathBuf>) -> Self {
        self.link_counts = Some(path.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Stop after this many pages (for testing)
    pub limit: Option<u64>,
    /// Pages classified together on the rayon pool
    pub batch_size: usize,
    /// Directory for the pending-row spool; system temp dir when `None`
    pub spool_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            limit: None,
            batch_size: DEFAULT_BATCH_SIZE,
            spool_dir: None,
        }
    }
}

/// What a single page contributes to the output.
#[derive(Debug, PartialEq)]
pub enum Outcome<'a> {
    /// Article with at least one category; `links` feed the inbound counts
    Article {
        pending: PendingArticle,
        links: &'a IndexSet<String>,
    },
    /// Category page, written straight away
    Category(CategoryRow),
    /// Article without categories (disambiguation and the like), dropped
    Unclassified,
    Ignored,
}

/// Routes a page by namespace and derives its rows.
///
/// Articles without parent categories are dropped before their links are
/// looked at, so they never count toward another page's inbound links.
pub fn classify(page: &PageRecord) -> Outcome<'_> {
    match page.namespace() {
        Some(ARTICLE_NAMESPACE) => {
            let parents = page.parents();
            if parents.is_empty() {
                debug!(title = page.title(), "Dropping article without categories");
                return Outcome::Unclassified;
            }

            let lifespan = Lifespan::from_categories(parents.iter().map(String::as_str));
            let biography = lifespan.is_known() && !page.title().starts_with(LIST_PREFIX);

            Outcome::Article {
                pending: PendingArticle {
                    title: page.title().to_string(),
                    parents: parents.iter().cloned().collect(),
                    lifespan: biography.then_some(lifespan),
                },
                links: page.links(),
            }
        }
        Some(CATEGORY_NAMESPACE) => match page.title().strip_prefix(CATEGORY_PREFIX) {
            Some(name) => Outcome::Category(CategoryRow {
                title: name.to_string(),
                parents: page.parents().iter().cloned().collect(),
            }),
            None => Outcome::Ignored,
        },
        _ => Outcome::Ignored,
    }
}

/// Two-pass aggregation state.
///
/// Pass 1 ([`Aggregator::process_batch`]) counts links and spools articles;
/// pass 2 ([`Aggregator::finish`]) replays the spool once every count is final.
pub struct Aggregator {
    counts: LinkCounts,
    spool: Spool<PendingArticle>,
    stats: ExtractionStats,
}

impl Aggregator {
    pub fn new(spool_dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            counts: LinkCounts::new(),
            spool: Spool::new(spool_dir)?,
            stats: ExtractionStats::new(),
        })
    }

    /// Classifies a batch in parallel, then applies the outcomes in page order.
    pub fn process_batch<C: RowSink>(
        &mut self,
        batch: &[PageRecord],
        categories: &mut C,
    ) -> Result<()> {
        let outcomes: Vec<Outcome<'_>> = batch.par_iter().map(classify).collect();

        let shard = outcomes
            .par_iter()
            .fold(LinkCounts::new, |mut shard, outcome| {
                if let Outcome::Article { links, .. } = outcome {
                    shard.add_source(links.iter().map(String::as_str));
                }
                shard
            })
            .reduce(LinkCounts::new, LinkCounts::merge);
        self.counts = std::mem::take(&mut self.counts).merge(shard);

        for outcome in outcomes {
            self.stats.inc_pages();
            match outcome {
                Outcome::Article { pending, links } => {
                    self.stats.inc_articles();
                    self.stats.add_links(links.len() as u64);
                    if pending.lifespan.is_some() {
                        self.stats.inc_biographies();
                    }
                    self.spool.push(&pending)?;
                }
                Outcome::Category(row) => {
                    categories.write_row(&row)?;
                    self.stats.inc_categories();
                }
                Outcome::Unclassified => self.stats.inc_unclassified(),
                Outcome::Ignored => self.stats.inc_ignored(),
            }
        }

        Ok(())
    }

    pub fn link_counts(&self) -> &LinkCounts {
        &self.counts
    }

    /// Writes every spooled article with its final inbound link count.
    pub fn finish<P: RowSink, B: RowSink>(
        self,
        pages: &mut P,
        biographies: &mut B,
    ) -> Result<(LinkCounts, ExtractionStats)> {
        info!(
            articles = self.spool.len(),
            linked_titles = self.counts.len(),
            "Writing pages with inbound link counts"
        );

        for pending in self.spool.into_reader()? {
            let pending = pending?;
            let inbound_links = self.counts.get(&pending.title);

            if let Some(lifespan) = pending.lifespan {
                biographies.write_row(&BiographicalRow {
                    title: pending.title.clone(),
                    lifespan,
                    inbound_links,
                    parents: pending.parents.clone(),
                })?;
            }

            pages.write_row(&PageRow {
                title: pending.title,
                inbound_links,
                parents: pending.parents,
            })?;
        }

        Ok((self.counts, self.stats))
    }
}

/// Runs both passes over any page stream, writing to the given sinks.
pub fn extract_pages<I, C, P, B>(
    pages: I,
    options: &ExtractOptions,
    categories: &mut C,
    page_rows: &mut P,
    biographies: &mut B,
) -> Result<(LinkCounts, ExtractionStats)>
where
    I: Iterator<Item = Result<PageRecord>>,
    C: RowSink,
    P: RowSink,
    B: RowSink,
{
    let mut aggregator = Aggregator::new(options.spool_dir.as_deref())?;
    let batch_size = options.batch_size.max(1);
    let limit = options
        .limit
        .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);

    let pb = ProgressBar::new_spinner();
    let mut batch = Vec::with_capacity(batch_size);
    let mut seen: u64 = 0;

    for page in pages.take(limit) {
        batch.push(page?);
        seen += 1;
        if seen % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{} pages", seen));
            pb.tick();
        }
        if batch.len() >= batch_size {
            aggregator.process_batch(&batch, categories)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        aggregator.process_batch(&batch, categories)?;
    }

    pb.finish_and_clear();
    info!(pages = seen, "Link counting pass complete");

    aggregator.finish(page_rows, biographies)
}

/// Extracts the pages, categories and biographies tables from a dump.
///
/// Tables only appear at their final paths once the whole run succeeded.
pub fn run_extraction(
    input: &str,
    output: &OutputPaths,
    options: &ExtractOptions,
) -> Result<ExtractionStats> {
    let reader = WikiReader::open(input)?;
    info!("Extracting from: {}", input);

    let mut categories = TableFile::create(&output.categories)?;
    let mut pages = TableFile::create(&output.pages)?;
    let mut biographies = TableFile::create(&output.biographies)?;

    let (counts, stats) = extract_pages(
        reader,
        options,
        &mut categories,
        &mut pages,
        &mut biographies,
    )?;

    let mut staged = Vec::with_capacity(4);
    for table in [categories, pages, biographies] {
        staged.push(table.stage()?);
    }
    if let Some(path) = &output.link_counts {
        staged.push(stage_link_counts(&counts, path)?);
    }

    for (path, rows) in persist_all(staged)? {
        info!(rows, path = ?path, "Table written");
    }

    Ok(stats)
}

/// Stages `title \t count` for every linked title in title order.
pub fn stage_link_counts(counts: &LinkCounts, path: &Path) -> Result<StagedTable> {
    let mut table = TableFile::create(path)?;
    for (title, inbound_links) in counts.sorted() {
        table.write_row(&LinkCountRow {
            title,
            inbound_links,
        })?;
    }
    debug!(rows = table.rows(), linked_titles = counts.len(), "Link count table staged");
    table.stage()
}

#[derive(Serialize)]
struct InfoboxLine<'a> {
    title: &'a str,
    infobox: &'a Infobox,
}

/// Writes the first infobox of every article as one JSON object per line.
pub fn export_infoboxes<I, W>(pages: I, out: W, limit: Option<u64>) -> Result<ExtractionStats>
where
    I: Iterator<Item = Result<PageRecord>>,
    W: Write,
{
    let stats = ExtractionStats::new();
    let limit = limit
        .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    let mut out = out;

    for page in pages.take(limit) {
        let page = page?;
        stats.inc_pages();
        if page.namespace() != Some(ARTICLE_NAMESPACE) {
            stats.inc_ignored();
            continue;
        }
        stats.inc_articles();

        if let Some(infobox) = page.infobox() {
            serde_json::to_writer(
                &mut out,
                &InfoboxLine {
                    title: page.title(),
                    infobox: &infobox,
                },
            )
            .context("Failed to serialize infobox")?;
            out.write_all(b"\n")
                .context("Failed to write infobox line")?;
            stats.inc_infoboxes();
        }
    }

    out.flush().context("Failed to flush infobox output")?;
    Ok(stats)
}

/// Runs [`export_infoboxes`] from a dump file into a JSON lines file.
///
/// The file only appears at `output` once the whole dump was read.
pub fn run_infobox_export(input: &str, output: &Path, limit: Option<u64>) -> Result<ExtractionStats> {
    let reader = WikiReader::open(input)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, temp_file_beside(output)?);
    let stats = export_infoboxes(reader, &mut writer, limit)?;

    let tmp = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush infobox output: {:?}", output))?;
    persist_file(tmp, output)?;
    info!(
        infoboxes = stats.infoboxes(),
        path = ?output,
        "Infobox export complete"
    );
    Ok(stats)
}
