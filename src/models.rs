use crate::content;
use crate::infobox::{self, Infobox};
use crate::lifespan::Lifespan;
use indexmap::IndexSet;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Outbound references of a page, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub links: IndexSet<String>,
    pub parents: IndexSet<String>,
}

/// One non-redirect page with a title and a body.
///
/// Fields are fixed at construction; `references` is derived from the text
/// on first access and kept for the lifetime of the record.
#[derive(Debug)]
pub struct PageRecord {
    title: String,
    namespace: Option<i32>,
    text: String,
    references: OnceCell<References>,
}

impl PageRecord {
    pub fn new(title: impl Into<String>, namespace: Option<i32>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            namespace,
            text: text.into(),
            references: OnceCell::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// `None` when the dump had no `<ns>` or an unparsable one.
    pub fn namespace(&self) -> Option<i32> {
        self.namespace
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn references(&self) -> &References {
        self.references
            .get_or_init(|| content::extract_references(&self.text))
    }

    pub fn links(&self) -> &IndexSet<String> {
        &self.references().links
    }

    pub fn parents(&self) -> &IndexSet<String> {
        &self.references().parents
    }

    /// Parses the first infobox. Not cached.
    pub fn infobox(&self) -> Option<Infobox> {
        infobox::parse_infobox(&self.text)
    }
}

/// An article waiting for its inbound link count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingArticle {
    pub title: String,
    pub parents: Vec<String>,
    /// Set only for biography candidates
    pub lifespan: Option<Lifespan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRow {
    pub title: String,
    pub inbound_links: u32,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub title: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiographicalRow {
    pub title: String,
    pub lifespan: Lifespan,
    pub inbound_links: u32,
    pub parents: Vec<String>,
}

/// One entry of the inbound link count table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkCountRow<'a> {
    pub title: &'a str,
    pub inbound_links: u32,
}
