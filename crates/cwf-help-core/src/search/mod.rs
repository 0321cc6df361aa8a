//! Full-text search over help content.
//!
//! Every `*.htm`/`*.html` page in a module's directory is reduced to its
//! title and visible text and kept in a JSON index file. A per-module
//! version tracker avoids re-indexing modules that have not changed.
//! Queries require every word to occur in a page (case-insensitive
//! substring match) and rank pages with `nucleo-matcher` scores.

mod html;

pub use html::HtmlExtractor;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use cwf_help_types::{HelpModule, HelpTopic, encode_url};
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::helpset::resource_path;

/// Name of the index file inside the index directory.
pub const INDEX_FILE: &str = "search-index.json";

/// Default cap on the number of hits returned by a query.
pub const DEFAULT_MAX_RESULTS: usize = 9999;

const INDEX_VERSION: u32 = 1;

const TITLE_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchIndex {
    version: u32,
    /// Indexed module id -> module version.
    #[serde(default)]
    modules: BTreeMap<String, String>,
    #[serde(default)]
    documents: Vec<IndexedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexedDocument {
    module: String,
    source: String,
    title: String,
    url: String,
    content: String,
}

/// A page matching a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub topic: HelpTopic,
    pub confidence: f64,
}

/// Relevance of a hit relative to the best and worst hit of its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relevance {
    Low,
    Medium,
    High,
}

impl Relevance {
    /// Split the confidence range of `hits` into tertiles and rank each hit.
    ///
    /// `hits` must be sorted by descending confidence, as returned by
    /// [`HelpSearchService::search`].
    #[must_use]
    pub fn tiers(hits: &[SearchHit]) -> Vec<Relevance> {
        let (Some(first), Some(last)) = (hits.first(), hits.last()) else {
            return Vec::new();
        };

        let high = first.confidence;
        let low = last.confidence;
        let interval = (high - low) / 3.0;
        let tertile1 = low + interval;
        let tertile2 = tertile1 + interval;

        hits.iter()
            .map(|hit| {
                if hit.confidence >= tertile2 {
                    Relevance::High
                } else if hit.confidence >= tertile1 {
                    Relevance::Medium
                } else {
                    Relevance::Low
                }
            })
            .collect()
    }
}

pub struct HelpSearchService {
    path: Option<PathBuf>,
    index: SearchIndex,
    dirty: bool,
    max_results: usize,
    extractor: HtmlExtractor,
    matcher: Matcher,
}

impl std::fmt::Debug for HelpSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpSearchService")
            .field("path", &self.path)
            .field("modules", &self.index.modules)
            .field("documents", &self.index.documents.len())
            .field("dirty", &self.dirty)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl HelpSearchService {
    /// Open the index stored in `index_dir`, starting empty if there is none.
    ///
    /// An index written by an incompatible version, or one that cannot be
    /// parsed, is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing index file cannot be read.
    pub fn open(index_dir: &Path, max_results: usize) -> Result<Self> {
        let path = index_dir.join(INDEX_FILE);
        let mut service = Self::build(Some(path.clone()), max_results)?;

        if !path.exists() {
            debug!("Search index not found at {}", path.display());
            return Ok(service);
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<SearchIndex>(&content) {
            Ok(index) if index.version == INDEX_VERSION => {
                info!(
                    "Loaded search index ({} modules, {} documents)",
                    index.modules.len(),
                    index.documents.len()
                );
                service.index = index;
            }
            Ok(index) => {
                warn!(
                    "Discarding search index with version {} (expected {INDEX_VERSION})",
                    index.version
                );
                service.dirty = true;
            }
            Err(e) => {
                warn!(
                    "Failed to parse search index: {} (at line {}, column {})",
                    e,
                    e.line(),
                    e.column()
                );
                service.dirty = true;
            }
        }

        Ok(service)
    }

    /// Index kept only in memory; [`save`](Self::save) is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the text extraction patterns fail to compile.
    pub fn in_memory(max_results: usize) -> Result<Self> {
        Self::build(None, max_results)
    }

    fn build(path: Option<PathBuf>, max_results: usize) -> Result<Self> {
        Ok(Self {
            path,
            index: SearchIndex {
                version: INDEX_VERSION,
                ..SearchIndex::default()
            },
            dirty: false,
            max_results,
            extractor: HtmlExtractor::new()?,
            matcher: Matcher::new(Config::DEFAULT),
        })
    }

    /// True if the module is indexed at its current version.
    #[must_use]
    pub fn is_indexed(&self, module: &HelpModule) -> bool {
        self.index.modules.get(&module.id) == Some(&module.version)
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.index.documents.len()
    }

    /// Index every HTML page in the module's directory under `content_root`.
    ///
    /// Returns the number of pages indexed, zero when the module was already
    /// indexed at this version.
    ///
    /// # Errors
    ///
    /// Returns an error if the module directory cannot be listed.
    pub fn index_help_module(&mut self, module: &HelpModule, content_root: &Path) -> Result<usize> {
        if self.is_indexed(module) {
            debug!("Help module {} already indexed", module.id);
            return Ok(0);
        }

        self.unindex_help_module(module);
        info!("Indexing help module {}", module.id);

        let base_path = module.base_path();
        let dir = resource_path(content_root, base_path);
        let mut pages: Vec<_> = std::fs::read_dir(&dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_html(path))
            .collect();
        pages.sort();

        let mut count = 0;
        for page in pages {
            let Some(file_name) = page.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let html = match std::fs::read(&page) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!("Skipping help page {}: {e}", page.display());
                    continue;
                }
            };

            let title = self
                .extractor
                .title(&html)
                .unwrap_or_else(|| file_name.to_string());

            self.index.documents.push(IndexedDocument {
                module: module.id.clone(),
                source: module.title.clone(),
                title,
                url: encode_url(&format!("{base_path}{file_name}")),
                content: self.extractor.text(&html),
            });
            count += 1;
        }

        self.index
            .modules
            .insert(module.id.clone(), module.version.clone());
        self.dirty = true;
        info!("Indexed {count} pages of help module {}", module.id);
        Ok(count)
    }

    /// Remove a module's pages from the index.
    pub fn unindex_help_module(&mut self, module: &HelpModule) {
        let before = self.index.documents.len();
        self.index.documents.retain(|doc| doc.module != module.id);
        let removed = self.index.modules.remove(&module.id).is_some();

        if removed || before != self.index.documents.len() {
            debug!("Removed search index for help module {}", module.id);
            self.dirty = true;
        }
    }

    /// Find pages containing every word of `words`, limited to `modules`.
    ///
    /// Hits are sorted by descending confidence and capped at the configured
    /// maximum. Blank queries match nothing.
    pub fn search(&mut self, words: &str, modules: &[HelpModule]) -> Vec<SearchHit> {
        if words.trim().is_empty() {
            return Vec::new();
        }

        let pattern = Pattern::new(
            words,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Substring,
        );
        let wanted: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();

        let mut hits = Vec::new();
        let mut buf = Vec::new();
        let mut title_buf = Vec::new();

        for doc in &self.index.documents {
            if !wanted.contains(doc.module.as_str()) {
                continue;
            }

            let haystack = format!("{} {}", doc.title, doc.content);
            let Some(score) = pattern.score(Utf32Str::new(&haystack, &mut buf), &mut self.matcher)
            else {
                continue;
            };

            let title_score = pattern
                .score(Utf32Str::new(&doc.title, &mut title_buf), &mut self.matcher)
                .unwrap_or(0);

            hits.push(SearchHit {
                topic: HelpTopic::new(Some(doc.url.clone()), doc.title.clone(), doc.source.clone()),
                confidence: f64::from(score) + f64::from(title_score) * TITLE_WEIGHT,
            });
        }

        hits.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.topic.cmp(&b.topic))
        });
        hits.truncate(self.max_results);
        debug!("Search for '{words}' found {} hits", hits.len());
        hits
    }

    /// Write the index if it changed since it was loaded or last saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the index file cannot be written.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if !self.dirty {
            return Ok(());
        }

        let content = serde_json::to_string(&self.index)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        self.dirty = false;

        debug!("Saved search index to {}", path.display());
        Ok(())
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("htm") || ext.eq_ignore_ascii_case("html"))
}
