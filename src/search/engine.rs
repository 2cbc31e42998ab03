//! Ranked lemma search over the stored index

use crate::config::{Config, SearchConfig};
use crate::crawler::{extract_text, extract_title, Fetcher};
use crate::lemma::LemmaExtractor;
use crate::search::snippet::build_snippet;
use crate::search::SearchError;
use crate::storage::{IndexRecord, LemmaRecord, SharedStorage, SiteRecord, SqliteStorage, Storage};
use crate::SeekError;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub site: String,
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Number of matching pages before pagination
    pub count: usize,
    pub data: Vec<SearchResult>,
}

/// A matching page before titles and snippets are rendered
#[derive(Debug, Clone)]
struct Hit {
    site_url: String,
    site_name: String,
    path: String,
    content: String,
    relevance: f64,
}

/// Answers ranked queries against the lemma index
pub struct SearchEngine {
    config: Arc<Config>,
    storage: SharedStorage,
    extractor: Arc<dyn LemmaExtractor>,
    fetcher: Fetcher,
}

impl SearchEngine {
    /// Creates a search engine over the shared storage
    pub fn new(
        config: Arc<Config>,
        storage: SharedStorage,
        extractor: Arc<dyn LemmaExtractor>,
    ) -> Result<Self, SeekError> {
        let fetcher = Fetcher::new(&config.crawler)?;
        Ok(Self {
            config,
            storage,
            extractor,
            fetcher,
        })
    }

    /// Runs a query
    ///
    /// # Arguments
    ///
    /// * `query` - Free text query
    /// * `site` - Root url of the site to search, or None for every configured site
    /// * `offset` - Results to skip (default 0)
    /// * `limit` - Results to return (default from configuration)
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Total match count and the requested slice
    /// * `Err(SearchError)` - Empty query, unknown site, or nothing in the slice
    pub async fn search(
        &self,
        query: &str,
        site: Option<&str>,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<SearchResponse, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let hits = self.collect_hits(query, site.filter(|s| !s.trim().is_empty()))?;
        let count = hits.len();

        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(self.config.search.default_limit);
        let slice: Vec<Hit> = hits.into_iter().skip(offset).take(limit).collect();
        if slice.is_empty() {
            return Err(SearchError::NothingFound);
        }

        let mut data = Vec::with_capacity(slice.len());
        for hit in slice {
            let title = self.title_for(&hit).await;
            let snippet = build_snippet(
                &extract_text(&hit.content),
                query,
                self.config.search.snippet_length,
            );
            data.push(SearchResult {
                site: hit.site_url,
                site_name: hit.site_name,
                uri: hit.path,
                title,
                snippet,
                relevance: hit.relevance,
            });
        }

        Ok(SearchResponse { count, data })
    }

    /// Finds and orders every matching page of the scoped sites
    fn collect_hits(&self, query: &str, scope: Option<&str>) -> Result<Vec<Hit>, SearchError> {
        let lemmas = self.extractor.lemma_set(query);
        let storage = self.storage.lock();

        let mut hits = Vec::new();
        match scope {
            Some(site_url) => {
                let site_url = site_url.trim().trim_end_matches('/');
                let site = storage
                    .get_site_by_url(site_url)?
                    .ok_or_else(|| SearchError::SiteNotFound(site_url.to_string()))?;
                let filtered = relevant_lemmas(&storage, &self.config.search, &site, &lemmas)?;
                if filtered.is_empty() {
                    return Err(SearchError::NothingFound);
                }
                hits.extend(rank_site(&storage, &site, &filtered)?);
            }
            None => {
                for entry in &self.config.sites {
                    let Some(site) = storage.get_site_by_url(&entry.url)? else {
                        continue;
                    };
                    let filtered = relevant_lemmas(&storage, &self.config.search, &site, &lemmas)?;
                    hits.extend(rank_site(&storage, &site, &filtered)?);
                }
            }
        }

        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.site_url.cmp(&b.site_url))
                .then_with(|| a.path.cmp(&b.path))
        });

        debug!("Query '{}' matched {} pages", query, hits.len());
        Ok(hits)
    }

    async fn title_for(&self, hit: &Hit) -> String {
        if self.config.search.live_titles {
            let url = format!("{}{}", hit.site_url, hit.path);
            if let Some(title) = self.fetcher.fetch_title(&url).await {
                return title;
            }
        }
        extract_title(&hit.content).unwrap_or_default()
    }
}

/// Looks up the query lemmas of a site and drops the too common ones
///
/// The survivors are ordered by ascending frequency, then text, so the
/// rarest lemma comes first.
fn relevant_lemmas(
    storage: &SqliteStorage,
    config: &SearchConfig,
    site: &SiteRecord,
    lemmas: &BTreeSet<String>,
) -> Result<Vec<LemmaRecord>, SearchError> {
    let pages = storage.count_pages(site.id)? as f64;
    let ceiling = pages * config.popularity_threshold;

    let mut filtered = Vec::new();
    for text in lemmas {
        let Some(lemma) = storage.find_lemma(site.id, text)? else {
            continue;
        };
        let frequency = lemma.frequency as f64;
        let keep = if config.inclusive_threshold {
            frequency <= ceiling
        } else {
            frequency < ceiling
        };
        if keep {
            filtered.push(lemma);
        }
    }

    filtered.sort_by(|a, b| a.frequency.cmp(&b.frequency).then_with(|| a.lemma.cmp(&b.lemma)));
    Ok(filtered)
}

/// Intersects the postings of the filtered lemmas and scores the pages
fn rank_site(
    storage: &SqliteStorage,
    site: &SiteRecord,
    lemmas: &[LemmaRecord],
) -> Result<Vec<Hit>, SearchError> {
    let mut postings = Vec::with_capacity(lemmas.len());
    for lemma in lemmas {
        let list = storage.postings_for_lemma(lemma.id)?;
        if list.is_empty() {
            return Ok(Vec::new());
        }
        postings.push(list);
    }

    let scores = intersect_postings(&postings);
    let max = match scores.values().copied().fold(0.0, f64::max) {
        m if m > 0.0 => m,
        _ => 1.0,
    };

    let mut hits = Vec::with_capacity(scores.len());
    for (page_id, absolute) in scores {
        let page = storage.get_page(page_id)?;
        hits.push(Hit {
            site_url: site.url.clone(),
            site_name: site.name.clone(),
            path: page.path,
            content: page.content,
            relevance: absolute / max,
        });
    }
    Ok(hits)
}

/// Intersects posting lists and sums the ranks of the surviving pages
///
/// The lists are processed in the given order, which should put the
/// shortest list first; the result does not depend on the order.
pub fn intersect_postings(lists: &[Vec<IndexRecord>]) -> HashMap<i64, f64> {
    let Some((first, rest)) = lists.split_first() else {
        return HashMap::new();
    };

    let mut scores: HashMap<i64, f64> = HashMap::new();
    for posting in first {
        *scores.entry(posting.page_id).or_insert(0.0) += posting.rank;
    }

    for list in rest {
        if scores.is_empty() {
            break;
        }
        let ranks: HashMap<i64, f64> = list.iter().map(|p| (p.page_id, p.rank)).collect();
        scores.retain(|page_id, _| ranks.contains_key(page_id));
        for (page_id, score) in scores.iter_mut() {
            if let Some(rank) = ranks.get(page_id) {
                *score += rank;
            }
        }
    }

    scores
}
