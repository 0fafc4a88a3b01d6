use rustc_hash::FxHashMap;

/// Inbound link counts: title -> number of distinct source articles linking to it.
///
/// Each source article contributes at most once per title, so callers feed
/// deduplicated link sets. Shards built on separate threads are combined
/// with [`LinkCounts::merge`]; summing is order independent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkCounts {
    counts: FxHashMap<String, u32>,
}

impl LinkCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one source article linking to every title in `links`.
    pub fn add_source<'a, I>(&mut self, links: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for title in links {
            match self.counts.get_mut(title) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(title.to_string(), 1);
                }
            }
        }
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(self, other: LinkCounts) -> LinkCounts {
        let (mut large, small) = if self.counts.len() >= other.counts.len() {
            (self.counts, other.counts)
        } else {
            (other.counts, self.counts)
        };
        for (title, count) in small {
            *large.entry(title).or_insert(0) += count;
        }
        LinkCounts { counts: large }
    }

    /// Count for `title`, 0 when nothing links to it.
    pub fn get(&self, title: &str) -> u32 {
        self.counts.get(title).copied().unwrap_or(0)
    }

    /// Number of distinct linked titles
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All counts sorted by title.
    pub fn sorted(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .counts
            .iter()
            .map(|(title, count)| (title.as_str(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
