use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::LocatorDocument;
use crate::error::{HarnessError, Result};

enum Source {
    /// One `<page>.json` file per page.
    Directory(PathBuf),
    /// Everything preloaded; nothing to read.
    Memory,
}

/// Resolves page names to locator documents, loading each at most once.
pub struct LocatorRepository {
    source: Source,
    cache: Mutex<HashMap<String, Arc<LocatorDocument>>>,
}

impl LocatorRepository {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Directory(dir.into()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_documents(documents: impl IntoIterator<Item = LocatorDocument>) -> Self {
        let cache = documents
            .into_iter()
            .map(|doc| (doc.page().to_string(), Arc::new(doc)))
            .collect();
        Self {
            source: Source::Memory,
            cache: Mutex::new(cache),
        }
    }

    /// Build from a single JSON object keyed by page name.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let pages: HashMap<String, LocatorDocument> = serde_json::from_str(json)?;
        Ok(Self::from_documents(
            pages.into_iter().map(|(page, doc)| doc.with_page(page)),
        ))
    }

    /// The document for `page`, loading it on first use.
    pub fn resolve(&self, page: &str) -> Result<Arc<LocatorDocument>> {
        if let Some(doc) = self.lock().get(page) {
            return Ok(Arc::clone(doc));
        }

        let dir = match &self.source {
            Source::Directory(dir) => dir,
            Source::Memory => return Err(not_found(page)),
        };
        let doc = Arc::new(load(dir, page)?);
        tracing::debug!("Loaded locators for page '{}'", page);

        // A concurrent resolve may have won; either copy is identical.
        let mut cache = self.lock();
        Ok(Arc::clone(cache.entry(page.to_string()).or_insert(doc)))
    }

    /// Names of the pages loaded so far.
    pub fn loaded_pages(&self) -> Vec<String> {
        let mut pages: Vec<String> = self.lock().keys().cloned().collect();
        pages.sort();
        pages
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<LocatorDocument>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(page: &str) -> HarnessError {
    HarnessError::NotFound {
        page: page.to_string(),
    }
}

fn load(dir: &Path, page: &str) -> Result<LocatorDocument> {
    // Page names come from feature text; keep them inside the locator dir
    if page.is_empty() || page.contains(['/', '\\']) || page.contains("..") {
        return Err(not_found(page));
    }

    let path = dir.join(format!("{}.json", page));
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(page)),
        Err(source) => return Err(HarnessError::LocatorLoad { path, source }),
    };

    LocatorDocument::from_json(page, &content)
        .map_err(|source| HarnessError::LocatorParse { path, source })
}
