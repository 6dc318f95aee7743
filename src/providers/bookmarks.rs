use crate::config;
use crate::model::MenuItem;
use crate::providers::{Provider, ProviderMeta};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{info, warn};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Bookmark {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Bookmarks kept in a JSON file. The file is read on construction and
/// again on every `refresh`; `load_items` serves the in-memory copy.
pub struct BookmarkProvider {
    meta: ProviderMeta,
    path: Option<PathBuf>,
    bookmarks: Vec<Bookmark>,
}

pub fn default_bookmarks_path() -> Option<PathBuf> {
    config::project_dirs().map(|dirs| dirs.data_dir().join("bookmarks.json"))
}

fn read_bookmarks(path: &Path) -> Result<Vec<Bookmark>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let bookmarks = serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(bookmarks)
}

impl BookmarkProvider {
    pub fn new(meta: ProviderMeta, path: Option<PathBuf>) -> Self {
        let path = path.or_else(default_bookmarks_path);
        let mut provider = Self { meta, path, bookmarks: Vec::new() };
        if let Err(e) = provider.refresh() {
            warn!("BookmarkProvider '{}': {:#}", provider.meta.name, e);
        }
        provider
    }
}

impl Provider for BookmarkProvider {
    fn name(&self) -> &str {
        &self.meta.name
    }

    fn tab_label(&self) -> &str {
        &self.meta.label
    }

    fn tab_icon(&self) -> Option<&str> {
        self.meta.icon.as_deref()
    }

    fn load_items(&self) -> Result<Vec<MenuItem>> {
        let items = self
            .bookmarks
            .iter()
            .filter_map(|b| {
                MenuItem::bookmark(b.name.clone(), b.url.clone()).map(|item| {
                    item.with_icon(b.icon.clone())
                        .with_description(Some(b.url.clone()))
                        .with_keywords(b.keywords.clone())
                })
            })
            .collect();
        Ok(self.meta.finish(items))
    }

    fn supports_live_updates(&self) -> bool {
        true
    }

    fn refresh(&mut self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        self.bookmarks = read_bookmarks(path)?;
        info!("BookmarkProvider '{}': loaded {} bookmarks", self.meta.name, self.bookmarks.len());
        Ok(())
    }
}
