use crate::config::READ_BUFFER_SIZE;
use crate::models::PageRecord;
use anyhow::{bail, Context, Result};
use bzip2::read::MultiBzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};

#[derive(Clone, Copy)]
enum Field {
    Title,
    Namespace,
    Text,
}

#[derive(Default)]
struct PartialPage {
    title: String,
    namespace: String,
    text: String,
    redirect: bool,
}

impl PartialPage {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Namespace => &mut self.namespace,
            Field::Text => &mut self.text,
        }
    }

    fn into_record(self) -> Option<PageRecord> {
        if self.redirect || self.title.trim().is_empty() || self.text.trim().is_empty() {
            return None;
        }
        let namespace = self.namespace.trim().parse().ok();
        Some(PageRecord::new(self.title, namespace, self.text))
    }
}

/// Forward-only page stream over a MediaWiki XML export.
///
/// Holds a single `<page>` in memory at a time. Redirects and pages with a
/// blank title or body are skipped. A malformed document ends the stream
/// with one `Err`.
pub struct WikiReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    finished: bool,
}

impl WikiReader<Box<dyn BufRead>> {
    /// Opens a dump; paths ending in `.bz2` are decompressed on the fly.
    pub fn open(path: &str) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open wiki dump at: {}", path))?;
        let inner: Box<dyn BufRead> = if path.ends_with(".bz2") {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiBzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };
        Ok(Self::from_reader(inner))
    }
}

impl<R: BufRead> WikiReader<R> {
    pub fn from_reader(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(8192),
            finished: false,
        }
    }

    fn next_page(&mut self) -> Result<Option<PageRecord>> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let page_start = match self
                .reader
                .read_event_into(&mut self.buf)
                .with_context(|| format!("Malformed XML near byte {}", position))?
            {
                Event::Start(e) => e.name().as_ref() == b"page",
                Event::Eof => return Ok(None),
                _ => false,
            };

            if page_start {
                if let Some(page) = self.read_page()? {
                    return Ok(Some(page));
                }
            }
        }
    }

    /// Consumes events up to the matching `</page>`.
    fn read_page(&mut self) -> Result<Option<PageRecord>> {
        let mut page = PartialPage::default();
        let mut field: Option<Field> = None;

        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            match self
                .reader
                .read_event_into(&mut self.buf)
                .with_context(|| format!("Malformed XML near byte {}", position))?
            {
                Event::Start(e) => {
                    field = match e.name().as_ref() {
                        b"title" => Some(Field::Title),
                        b"ns" => Some(Field::Namespace),
                        b"text" => Some(Field::Text),
                        b"redirect" => {
                            page.redirect = true;
                            None
                        }
                        _ => None,
                    };
                }
                Event::Empty(e) => {
                    if e.name().as_ref() == b"redirect" {
                        page.redirect = true;
                    }
                }
                Event::Text(e) => {
                    if let Some(field) = field {
                        let text = e
                            .unescape()
                            .with_context(|| format!("Bad XML escape near byte {}", position))?;
                        page.field_mut(field).push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(field) = field {
                        let text = std::str::from_utf8(&e)
                            .with_context(|| format!("CDATA is not UTF-8 near byte {}", position))?;
                        page.field_mut(field).push_str(text);
                    }
                }
                Event::End(e) => {
                    if e.name().as_ref() == b"page" {
                        break;
                    }
                    field = None;
                }
                Event::Eof => bail!("Unexpected end of document inside <page>"),
                _ => {}
            }
        }

        Ok(page.into_record())
    }
}

impl<R: BufRead> Iterator for WikiReader<R> {
    type Item = Result<PageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(xml: &str) -> Vec<PageRecord> {
        WikiReader::from_reader(xml.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn page(title: &str, ns: &str, body: &str) -> String {
        format!(
            "<page><title>{}</title><ns>{}</ns><id>1</id><revision><text>{}</text></revision></page>",
            title, ns, body
        )
    }

    fn dump(pages: &[String]) -> String {
        format!("<mediawiki><siteinfo><sitename>Test</sitename></siteinfo>{}</mediawiki>", pages.concat())
    }

    #[test]
    fn reads_fields() {
        let pages = read_all(&dump(&[page("Ada Lovelace", "0", "[[Category:1815 births]]")]));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title(), "Ada Lovelace");
        assert_eq!(pages[0].namespace(), Some(0));
        assert_eq!(pages[0].text(), "[[Category:1815 births]]");
    }

    #[test]
    fn skips_redirects() {
        let redirect = "<page><title>Ada</title><ns>0</ns><redirect title=\"Ada Lovelace\" /><revision><text>#REDIRECT [[Ada Lovelace]]</text></revision></page>".to_string();
        let open_redirect = "<page><title>Byron</title><ns>0</ns><redirect>x</redirect><revision><text>#REDIRECT [[Lord Byron]]</text></revision></page>".to_string();
        let pages = read_all(&dump(&[redirect, page("Physics", "0", "body"), open_redirect]));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title(), "Physics");
    }

    #[test]
    fn skips_blank_title_or_text() {
        let pages = read_all(&dump(&[
            page("   ", "0", "body"),
            page("Empty", "0", " \n "),
            "<page><title>No text</title><ns>0</ns></page>".to_string(),
            "<page><title>Empty text</title><ns>0</ns><revision><text /></revision></page>".to_string(),
            page("Kept", "0", "body"),
        ]));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title(), "Kept");
    }

    #[test]
    fn bad_namespace_is_unset() {
        let pages = read_all(&dump(&[
            page("A", "abc", "body"),
            "<page><title>B</title><revision><text>body</text></revision></page>".to_string(),
            page("C", " 14 ", "body"),
        ]));
        assert_eq!(pages[0].namespace(), None);
        assert_eq!(pages[1].namespace(), None);
        assert_eq!(pages[2].namespace(), Some(14));
    }

    #[test]
    fn unescapes_entities() {
        let pages = read_all(&dump(&[page(
            "AT&amp;T",
            "0",
            "&lt;ref&gt;x&lt;/ref&gt; [[Bell &amp; Co]]",
        )]));
        assert_eq!(pages[0].title(), "AT&T");
        assert_eq!(pages[0].text(), "<ref>x</ref> [[Bell & Co]]");
    }

    #[test]
    fn reads_cdata() {
        let pages = read_all(&dump(&[page("A", "0", "<![CDATA[[[B]] & more]]>")]));
        assert_eq!(pages[0].text(), "[[B]] & more");
    }

    #[test]
    fn truncated_document_is_an_error() {
        let xml = "<mediawiki><page><title>A</title><ns>0</ns><revision><text>body";
        let results: Vec<_> = WikiReader::from_reader(xml.as_bytes()).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn error_ends_the_stream() {
        let xml = format!(
            "<mediawiki>{}<page><title>B</ns></page>{}</mediawiki>",
            page("A", "0", "body"),
            page("C", "0", "body")
        );
        let results: Vec<_> = WikiReader::from_reader(xml.as_bytes()).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(read_all("<mediawiki></mediawiki>").is_empty());
        assert!(read_all("").is_empty());
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(WikiReader::open("/nonexistent/dump.xml").is_err());
    }
}
