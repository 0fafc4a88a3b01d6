use crate::config::{LIST_SEPARATOR, WRITE_BUFFER_SIZE};
use crate::models::{BiographicalRow, CategoryRow, LinkCountRow, PageRow};
use anyhow::{anyhow, Context, Result};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// A row of one of the output tables.
pub trait TsvRow {
    fn write_fields<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()>;
}

/// Destination of finished rows.
pub trait RowSink {
    fn write_row<R: TsvRow>(&mut self, row: &R) -> Result<()>;
}

/// Replaces characters that would break the tab-separated layout.
fn sanitize_field(s: &str) -> Cow<'_, str> {
    if s.contains(['\t', '\n', '\r']) {
        Cow::Owned(s.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(s)
    }
}

fn join_list(items: &[String]) -> String {
    let mut joined = String::with_capacity(items.iter().map(|s| s.len() + 1).sum());
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            joined.push(LIST_SEPARATOR);
        }
        joined.push_str(&sanitize_field(item));
    }
    joined
}

fn optional_int(buf: &mut itoa::Buffer, value: Option<i32>) -> &str {
    match value {
        Some(v) => buf.format(v),
        None => "",
    }
}

impl TsvRow for PageRow {
    fn write_fields<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        let mut links = itoa::Buffer::new();
        out.write_record([
            &*sanitize_field(&self.title),
            links.format(self.inbound_links),
            join_list(&self.parents).as_str(),
        ])
    }
}

impl TsvRow for CategoryRow {
    fn write_fields<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        out.write_record([
            &*sanitize_field(&self.title),
            join_list(&self.parents).as_str(),
        ])
    }
}

impl TsvRow for BiographicalRow {
    fn write_fields<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        let (mut birth, mut death, mut age) =
            (itoa::Buffer::new(), itoa::Buffer::new(), itoa::Buffer::new());
        let mut links = itoa::Buffer::new();
        out.write_record([
            &*sanitize_field(&self.title),
            optional_int(&mut birth, self.lifespan.birth),
            optional_int(&mut death, self.lifespan.death),
            optional_int(&mut age, self.lifespan.age()),
            links.format(self.inbound_links),
            join_list(&self.parents).as_str(),
        ])
    }
}

impl TsvRow for LinkCountRow<'_> {
    fn write_fields<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        let mut links = itoa::Buffer::new();
        out.write_record([&*sanitize_field(self.title), links.format(self.inbound_links)])
    }
}

/// Tab-separated, unquoted, `\n`-terminated rows.
pub struct TsvWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(inner);
        Self { writer, rows: 0 }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush table: {}", e.error()))
    }
}

impl<W: Write> RowSink for TsvWriter<W> {
    fn write_row<R: TsvRow>(&mut self, row: &R) -> Result<()> {
        row.write_fields(&mut self.writer)
            .context("Failed to write table row")?;
        self.rows += 1;
        Ok(())
    }
}

/// Creates a temp file in the directory that will hold `path`, so a later
/// `persist` is a same-filesystem rename.
pub fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).with_context(|| format!("Failed to create temp file for: {:?}", path))
}

/// Table written to a temp file beside `path` and renamed into place by
/// [`TableFile::finish`]. Dropping it unfinished removes the temp file.
pub struct TableFile {
    path: PathBuf,
    writer: TsvWriter<BufWriter<NamedTempFile>>,
}

impl TableFile {
    pub fn create(path: &Path) -> Result<Self> {
        let tmp = temp_file_beside(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: TsvWriter::new(BufWriter::with_capacity(WRITE_BUFFER_SIZE, tmp)),
        })
    }

    pub fn rows(&self) -> u64 {
        self.writer.rows()
    }

    /// Flushes every row to the temp file without moving it.
    pub fn stage(self) -> Result<StagedTable> {
        let rows = self.writer.rows();
        let tmp = self
            .writer
            .into_inner()?
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("Failed to flush table: {:?}", self.path))?;
        Ok(StagedTable {
            path: self.path,
            tmp,
            rows,
        })
    }

    /// Flushes and atomically moves the table to its final path.
    pub fn finish(self) -> Result<u64> {
        self.stage()?.persist()
    }
}

/// A flushed table waiting to be renamed into place.
pub struct StagedTable {
    path: PathBuf,
    tmp: NamedTempFile,
    rows: u64,
}

impl StagedTable {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn persist(self) -> Result<u64> {
        persist_file(self.tmp, &self.path)?;
        Ok(self.rows)
    }
}

/// Renames a finished temp file to `path` and syncs it.
pub fn persist_file(tmp: NamedTempFile, path: &Path) -> Result<()> {
    let file: File = tmp
        .persist(path)
        .with_context(|| format!("Failed to move file into place: {:?}", path))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync file: {:?}", path))
}

/// Moves every staged table into place, or none of them.
///
/// When a rename fails, tables already moved are deleted again and the
/// remaining temp files are dropped. Returns `(path, rows)` per table.
pub fn persist_all(tables: Vec<StagedTable>) -> Result<Vec<(PathBuf, u64)>> {
    let mut written: Vec<(PathBuf, u64)> = Vec::with_capacity(tables.len());

    for table in tables {
        let path = table.path().to_path_buf();
        match table.persist() {
            Ok(rows) => written.push((path, rows)),
            Err(e) => {
                for (done, _) in &written {
                    if let Err(err) = fs::remove_file(done) {
                        warn!(path = ?done, error = %err, "Failed to remove partial table");
                    }
                }
                return Err(e);
            }
        }
    }

    Ok(written)
}

impl RowSink for TableFile {
    fn write_row<R: TsvRow>(&mut self, row: &R) -> Result<()> {
        self.writer.write_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifespan::Lifespan;
    use std::fs;
    use tempfile::TempDir;

    fn render<R: TsvRow>(rows: &[R]) -> String {
        let mut writer = TsvWriter::new(Vec::new());
        for row in rows {
            writer.write_row(row).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn page_row_layout() {
        let rows = [PageRow {
            title: "Ada Lovelace".to_string(),
            inbound_links: 42,
            parents: strings(&["1815 births", "1852 deaths"]),
        }];
        assert_eq!(render(&rows), "Ada Lovelace\t42\t1815 births|1852 deaths\n");
    }

    #[test]
    fn category_row_layout() {
        let rows = [
            CategoryRow {
                title: "Mathematicians".to_string(),
                parents: strings(&["Scientists", "People by occupation"]),
            },
            CategoryRow {
                title: "Orphans".to_string(),
                parents: vec![],
            },
        ];
        assert_eq!(
            render(&rows),
            "Mathematicians\tScientists|People by occupation\nOrphans\t\n"
        );
    }

    #[test]
    fn biographical_row_layout() {
        let rows = [
            BiographicalRow {
                title: "Augustus".to_string(),
                lifespan: Lifespan {
                    birth: Some(-63),
                    death: Some(14),
                },
                inbound_links: 7,
                parents: strings(&["63 BC births", "14 deaths"]),
            },
            BiographicalRow {
                title: "Someone".to_string(),
                lifespan: Lifespan {
                    birth: Some(1950),
                    death: None,
                },
                inbound_links: 0,
                parents: strings(&["1950 births"]),
            },
        ];
        assert_eq!(
            render(&rows),
            "Augustus\t-63\t14\t77\t7\t63 BC births|14 deaths\nSomeone\t1950\t\t\t0\t1950 births\n"
        );
    }

    #[test]
    fn link_count_row_layout() {
        let rows = [
            LinkCountRow {
                title: "Ada Lovelace",
                inbound_links: 3,
            },
            LinkCountRow {
                title: "Babbage",
                inbound_links: 1,
            },
        ];
        assert_eq!(render(&rows), "Ada Lovelace\t3\nBabbage\t1\n");
    }

    #[test]
    fn quotes_are_not_escaped() {
        let rows = [CategoryRow {
            title: "\"Weird\" Al".to_string(),
            parents: strings(&["Parodists"]),
        }];
        assert_eq!(render(&rows), "\"Weird\" Al\tParodists\n");
    }

    #[test]
    fn tabs_and_newlines_flattened() {
        let rows = [CategoryRow {
            title: "A\tB".to_string(),
            parents: strings(&["x\ny"]),
        }];
        assert_eq!(render(&rows), "A B\tx y\n");
    }

    #[test]
    fn table_file_persists_on_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("categories.tsv");

        let mut table = TableFile::create(&path).unwrap();
        table
            .write_row(&CategoryRow {
                title: "Physics".to_string(),
                parents: strings(&["Natural sciences"]),
            })
            .unwrap();
        assert!(!path.exists());

        assert_eq!(table.finish().unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Physics\tNatural sciences\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn persist_all_moves_every_table() {
        let dir = TempDir::new().unwrap();
        let mut staged = Vec::new();
        for name in ["a.tsv", "b.tsv"] {
            let mut table = TableFile::create(&dir.path().join(name)).unwrap();
            table
                .write_row(&CategoryRow {
                    title: name.to_string(),
                    parents: vec![],
                })
                .unwrap();
            staged.push(table.stage().unwrap());
        }

        let written = persist_all(staged).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].1, 1);
        assert_eq!(fs::read_to_string(dir.path().join("b.tsv")).unwrap(), "b.tsv\t\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn failed_persist_removes_earlier_tables() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let blocked = dir.path().join("blocked.tsv");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let first = dir.path().join("categories.tsv");
        let staged = vec![
            TableFile::create(&first).unwrap().stage().unwrap(),
            TableFile::create(&blocked).unwrap().stage().unwrap(),
            TableFile::create(&dir.path().join("pages.tsv"))
                .unwrap()
                .stage()
                .unwrap(),
        ];

        assert!(persist_all(staged).is_err());
        assert!(!first.exists());
        assert!(!dir.path().join("pages.tsv").exists());
        // Only the blocking directory remains.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unfinished_table_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pages.tsv");
        {
            let mut table = TableFile::create(&path).unwrap();
            table
                .write_row(&PageRow {
                    title: "Physics".to_string(),
                    inbound_links: 1,
                    parents: strings(&["Science"]),
                })
                .unwrap();
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
