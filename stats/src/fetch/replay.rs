use crate::{
    error::{
        Error,
        Result,
    },
    fetch::{
        Cursor,
        Page,
        PageSource,
        QuerySpec,
    },
    raw::RawRecord,
};
use std::path::Path;

/// Serves pre-recorded pages, e.g. a JSON dump captured from an earlier run.
///
/// The source ignores the query; seed filtering happens locally in the
/// pipeline.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    pages: Vec<Vec<RawRecord>>,
    fail_at: Option<Cursor>,
    requested: Vec<Cursor>,
}

impl ReplaySource {
    pub fn new(pages: Vec<Vec<RawRecord>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Reads a JSON array of pages, each an array of raw records.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::fetch_with(format!("cannot read replay file {}", path.display()), err))?;
        let pages: Vec<Vec<RawRecord>> = serde_json::from_str(&content)
            .map_err(|err| Error::fetch_with(format!("malformed replay file {}", path.display()), err))?;
        info!(pages = pages.len(), path = %path.display(), "Loaded replay pages");
        Ok(Self::new(pages))
    }

    /// Makes the request for `cursor` fail with a fetch error.
    pub fn failing_at(mut self, cursor: Cursor) -> Self {
        self.fail_at = Some(cursor);
        self
    }

    /// Cursors requested so far, in request order.
    pub fn requested(&self) -> &[Cursor] {
        &self.requested
    }
}

impl PageSource for ReplaySource {
    fn fetch_page(&mut self, _query: &QuerySpec, cursor: Cursor) -> Result<Page> {
        self.requested.push(cursor);
        if self.fail_at == Some(cursor) {
            return Err(Error::fetch(format!("replayed failure at page {}", cursor.index())));
        }

        let index = cursor.index() as usize;
        let records = self.pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < self.pages.len()).then(|| cursor.next());
        Ok(Page { records, next })
    }
}
