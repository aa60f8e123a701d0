//! # Paginated fetching
//!
//! A [`PageSource`] answers one page per call and tells the caller where the
//! next page starts. [`Fetch`] turns that contract into a lazy, single-pass
//! iterator of raw records.
//!
//! - **`http`**: the directory service over `reqwest::blocking`
//! - **`replay`**: scripted pages from memory or a JSON dump
//! - **`wire`**: decoder for the directory's binary payloads

pub mod http;
pub mod replay;
pub mod wire;

pub use http::HttpPageSource;
pub use replay::ReplaySource;

use crate::{
    error::{
        Error,
        Result,
    },
    model::{
        ClusterKey,
        CombatDifficulty,
        ResourceMultiplier,
    },
    normalize,
    raw::RawRecord,
};
use std::{
    collections::VecDeque,
    iter::FusedIterator,
    time::Duration,
};

/// Cluster parameters that, together with a seed, pin down one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterParams {
    pub star_count: u32,
    pub resource_multiplier: ResourceMultiplier,
    pub combat_difficulty: CombatDifficulty,
}

impl ClusterParams {
    /// Builds the parameters from the directory's raw codes.
    pub fn from_codes(star_count: u32, multiplier_code: i64, difficulty_code: i64) -> Result<Self> {
        if star_count == 0 {
            return Err(Error::schema("star_count", star_count));
        }
        Ok(Self {
            star_count,
            resource_multiplier: normalize::resource_multiplier(multiplier_code)?,
            combat_difficulty: normalize::combat_difficulty(difficulty_code)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedFilter {
    pub seed: u64,
    /// When known, the directory can filter server-side.
    pub cluster: Option<ClusterParams>,
}

impl SeedFilter {
    pub fn seed(seed: u64) -> Self {
        Self { seed, cluster: None }
    }

    pub fn matches(&self, key: &ClusterKey) -> bool {
        key.seed == self.seed
            && self.cluster.is_none_or(|params| {
                params.star_count == key.star_count
                    && params.resource_multiplier == key.resource_multiplier
                    && params.combat_difficulty == key.combat_difficulty
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySpec {
    FullScan,
    Seed(SeedFilter),
}

impl QuerySpec {
    pub fn from_filter(filter: Option<SeedFilter>) -> Self {
        filter.map_or(QuerySpec::FullScan, QuerySpec::Seed)
    }

    pub fn matches(&self, key: &ClusterKey) -> bool {
        match self {
            QuerySpec::FullScan => true,
            QuerySpec::Seed(filter) => filter.matches(key),
        }
    }
}

/// Zero-based page index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub u32);

impl Cursor {
    pub fn index(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Cursor(self.0 + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<RawRecord>,
    /// `None` once the source has nothing further.
    pub next: Option<Cursor>,
}

/// One request/response round trip against a data source.
pub trait PageSource {
    fn fetch_page(&mut self, query: &QuerySpec, cursor: Cursor) -> Result<Page>;
}

impl<S: PageSource + ?Sized> PageSource for &mut S {
    fn fetch_page(&mut self, query: &QuerySpec, cursor: Cursor) -> Result<Page> {
        (**self).fetch_page(query, cursor)
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn fetch_page(&mut self, query: &QuerySpec, cursor: Cursor) -> Result<Page> {
        (**self).fetch_page(query, cursor)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub max_pages: Option<u32>,
    /// Pause before every request but the first.
    pub page_delay: Duration,
}

impl FetchOptions {
    pub fn from_config(config: &milkyway_stats_config::Config) -> Self {
        Self {
            max_pages: config.max_pages,
            page_delay: config.page_delay,
        }
    }
}

/// Starts a lazy scan of `source`. No request is made until the first `next()`.
pub fn fetch_all<S: PageSource>(source: S, query: QuerySpec) -> Fetch<S> {
    Fetch::new(source, query, FetchOptions::default())
}

/// Lazy, single-pass sequence of raw records.
///
/// A page is only requested once every record of the previous page was
/// yielded. The first error ends the sequence; dropping the iterator stops
/// further requests.
pub struct Fetch<S> {
    source: S,
    query: QuerySpec,
    options: FetchOptions,
    next_cursor: Option<Cursor>,
    buffer: VecDeque<RawRecord>,
    pages_fetched: u32,
}

impl<S: PageSource> Fetch<S> {
    pub fn new(source: S, query: QuerySpec, options: FetchOptions) -> Self {
        Self {
            source,
            query,
            options,
            next_cursor: Some(Cursor::default()),
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    fn request(&mut self, cursor: Cursor) -> Result<()> {
        if self.pages_fetched > 0 && !self.options.page_delay.is_zero() {
            std::thread::sleep(self.options.page_delay);
        }

        let page = self.source.fetch_page(&self.query, cursor)?;
        self.pages_fetched += 1;
        debug!(page = cursor.index(), records = page.records.len(), "Fetched page");

        if page.records.is_empty() {
            return Ok(());
        }
        if let Some(next) = page.next {
            if next <= cursor {
                return Err(Error::fetch(format!(
                    "page {} pointed back to page {}",
                    cursor.index(),
                    next.index()
                )));
            }
        }
        self.next_cursor = page.next;
        self.buffer.extend(page.records);
        Ok(())
    }
}

impl<S: PageSource> Iterator for Fetch<S> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }

            let cursor = self.next_cursor.take()?;
            if self.options.max_pages.is_some_and(|max| self.pages_fetched >= max) {
                warn!(max_pages = self.pages_fetched, "Page limit reached, stopping the scan early");
                return None;
            }

            if let Err(err) = self.request(cursor) {
                self.buffer.clear();
                return Some(Err(err));
            }
        }
    }
}

impl<S: PageSource> FusedIterator for Fetch<S> {}
