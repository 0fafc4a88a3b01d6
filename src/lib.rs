//! Wikimine: category and link mining for Wikipedia XML dumps
//!
//! This crate turns a MediaWiki XML export into three tab-separated tables:
//!
//! 1. **Pages** -- `title \t inbound links \t parent1|parent2|...` for every
//!    article that belongs to at least one category
//! 2. **Categories** -- `category \t parent1|parent2|...` for every category page
//! 3. **Biographies** -- `title \t birth \t death \t age \t inbound links \t parents`
//!    for articles whose categories name a birth or death year
//!
//! # Architecture
//!
//! Inbound link counts are a whole-corpus aggregate, so extraction runs in
//! two passes over a single read of the dump:
//!
//! - **Pass 1** -- Stream pages, classify batches in parallel with rayon, fold
//!   each batch's links into a count shard, and spool pending article rows
//!   to an anonymous temp file
//! - **Pass 2** -- Replay the spool and write each row with its final count
//!
//! Category rows do not depend on counts and are written during pass 1.
//! Tables are renamed into place only when the whole run succeeds.
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML page reader with BZ2 decompression
//! - [`content`] -- Link and parent category extraction
//! - [`infobox`] -- First-infobox key/value extraction
//! - [`lifespan`] -- Birth/death years from category names
//! - [`index`] -- Inbound link counts with shard merging
//! - [`extract`] -- Two-pass aggregation and infobox export
//! - [`spool`] -- Temp-file buffer between the passes
//! - [`output`] -- Tab-separated table writers
//! - [`models`] -- Page records and row types
//! - [`stats`] -- Atomic counters for extraction metrics
//! - [`config`] -- Constants for namespaces, prefixes and file names
//!
//! # Example Usage
//!
//! ```bash
//! wikimine extract -i enwiki-latest-pages-articles.xml.bz2 -o output/
//! wikimine infoboxes -i enwiki-latest-pages-articles.xml.bz2 -o infoboxes.jsonl
//! ```

pub mod config;
pub mod content;
pub mod extract;
pub mod index;
pub mod infobox;
pub mod lifespan;
pub mod models;
pub mod output;
pub mod parser;
pub mod spool;
pub mod stats;
