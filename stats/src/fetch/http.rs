use crate::{
    error::{
        Error,
        Result,
    },
    fetch::{
        wire::{
            self,
            ClusterPage,
            Statistics,
            WirePlayer,
        },
        ClusterParams,
        Cursor,
        Page,
        PageSource,
        QuerySpec,
    },
    raw::RawRecord,
};
use milkyway_stats_config::Config;
use reqwest::blocking::Client;

/// Page source backed by the Milky Way directory service.
///
/// A full scan is one page: the global statistics plus the complete user
/// listing. A seed query with known cluster parameters walks the cluster's
/// paginated user listing instead; a bare seed falls back to the full scan.
pub struct HttpPageSource {
    client: Client,
    config: Config,
    paging: ClusterPaging,
}

/// What a request for `cursor` turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    FullScan,
    Cluster { seed: u64, params: ClusterParams },
    /// The full scan already answered everything at cursor 0.
    Exhausted,
}

impl Route {
    fn of(query: &QuerySpec, cursor: Cursor) -> Self {
        let cluster = match query {
            QuerySpec::Seed(filter) => filter.cluster.map(|params| (filter.seed, params)),
            QuerySpec::FullScan => None,
        };
        match cluster {
            Some((seed, params)) => Route::Cluster { seed, params },
            None if cursor.index() == 0 => Route::FullScan,
            None => Route::Exhausted,
        }
    }
}

/// Players served so far for the cluster being walked.
#[derive(Debug, Default)]
struct ClusterPaging {
    seen: u64,
}

impl ClusterPaging {
    /// Counts `page` and decides whether the directory has more.
    ///
    /// Cursor 0 starts a new walk. Another page is requested only while pages
    /// come back full and fewer than `page.total` players have been served.
    fn advance(&mut self, cursor: Cursor, page: ClusterPage, page_size: u32) -> Page {
        if cursor.index() == 0 {
            self.seen = 0;
        }
        let count = page.players.len() as u64;
        self.seen += count;

        let more = count == page_size as u64 && i64::try_from(self.seen).is_ok_and(|seen| seen < page.total);
        Page {
            records: page.players.into_iter().map(WirePlayer::into_raw_record).collect(),
            next: more.then(|| cursor.next()),
        }
    }
}

/// One record per listed player; the global counters ride on the first.
fn full_scan_page(statistics: Statistics, players: Vec<WirePlayer>) -> Page {
    let mut records: Vec<RawRecord> = players.into_iter().map(WirePlayer::into_raw_record).collect();
    if let Some(first) = records.first_mut() {
        first.sails_launched = Some(statistics.sails_launched);
        first.dyson_spheres = Some(statistics.dyson_spheres as i64);
    }
    Page { records, next: None }
}

impl HttpPageSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            config: config.clone(),
            paging: ClusterPaging::default(),
        })
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<u8>> {
        let url = self
            .config
            .endpoint_url(endpoint, params)
            .map_err(|err| Error::fetch(format!("{err:#}")))?;
        debug!(%url, "Requesting");
        let body = self.client.get(url).send()?.error_for_status()?.bytes()?;
        Ok(body.to_vec())
    }

    fn full_scan(&mut self) -> Result<Page> {
        let statistics = wire::decode_statistics(&self.get(&self.config.endpoints.statistics, &[])?)?;
        let players = wire::decode_user_list(&self.get(&self.config.endpoints.all_users, &[])?)?;
        info!(
            players = players.len(),
            reported_players = statistics.players,
            "Fetched the user listing"
        );
        Ok(full_scan_page(statistics, players))
    }

    fn cluster_page(&mut self, seed: u64, params: &ClusterParams, cursor: Cursor) -> Result<Page> {
        let page_size = self.config.page_size;
        let seed_key = wire::encode_seed_key(seed, params)?;
        let payload = self.get(
            &self.config.endpoints.cluster_users,
            &[
                ("seed_key", seed_key.to_string()),
                ("page_index", cursor.index().to_string()),
                ("page_size", page_size.to_string()),
            ],
        )?;
        let page = wire::decode_cluster_page(&payload, page_size)?;
        info!(
            seed,
            page = page.page_index,
            players = page.players.len(),
            total = page.total,
            "Fetched cluster page"
        );
        Ok(self.paging.advance(cursor, page, page_size))
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&mut self, query: &QuerySpec, cursor: Cursor) -> Result<Page> {
        match Route::of(query, cursor) {
            Route::FullScan => self.full_scan(),
            Route::Cluster { seed, params } => self.cluster_page(seed, &params, cursor),
            Route::Exhausted => Ok(Page::default()),
        }
    }
}
