use crate::config::WRITE_BUFFER_SIZE;
use anyhow::{Context, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::Path;

/// Append-only record buffer backed by an anonymous temp file.
///
/// Holds rows between the two extraction passes so memory stays flat on a
/// full dump. The file has no name on disk and disappears when the spool or
/// its reader is dropped, on success and on error alike.
pub struct Spool<T> {
    writer: BufWriter<File>,
    len: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Spool<T> {
    /// Creates a spool in `dir`, or in the system temp directory when `None`.
    pub fn new(dir: Option<&Path>) -> Result<Self> {
        let file = match dir {
            Some(dir) => tempfile::tempfile_in(dir)
                .with_context(|| format!("Failed to create spool file in: {:?}", dir))?,
            None => tempfile::tempfile().context("Failed to create spool file")?,
        };

        Ok(Self {
            writer: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            len: 0,
            _marker: PhantomData,
        })
    }

    pub fn push(&mut self, record: &T) -> Result<()> {
        bincode::DefaultOptions::new()
            .serialize_into(&mut self.writer, record)
            .context("Failed to write spool record")?;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Flushes and rewinds, yielding records in push order.
    pub fn into_reader(self) -> Result<SpoolReader<T>> {
        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush spool file")?;
        file.seek(SeekFrom::Start(0))
            .context("Failed to rewind spool file")?;

        Ok(SpoolReader {
            reader: BufReader::with_capacity(WRITE_BUFFER_SIZE, file),
            remaining: self.len,
            _marker: PhantomData,
        })
    }
}

pub struct SpoolReader<T> {
    reader: BufReader<File>,
    remaining: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for SpoolReader<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let record = bincode::DefaultOptions::new()
            .deserialize_from(&mut self.reader)
            .context("Failed to read spool record");
        if record.is_err() {
            self.remaining = 0;
        }
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}
