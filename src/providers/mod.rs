use crate::config::{ProviderConfig, ProviderKind};
use crate::model::MenuItem;
use anyhow::{Context, Result};
use regex::Regex;

pub mod bin;
pub mod bookmarks;
pub mod commands;
pub mod desktop;

/// A pluggable source of menu items.
///
/// `load_items` may be called on registration, whenever the provider's tab
/// becomes active, and after `refresh`. It must not block for long: slow
/// sources should gather data elsewhere and hand back what they cached.
pub trait Provider {
    /// Stable identity, unique within a registry.
    fn name(&self) -> &str;

    fn tab_label(&self) -> &str {
        self.name()
    }

    fn tab_icon(&self) -> Option<&str> {
        None
    }

    fn load_items(&self) -> Result<Vec<MenuItem>>;

    fn supports_live_updates(&self) -> bool {
        false
    }

    /// Re-reads the backing data of a live source.
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Identity and item post-processing shared by the built-in providers.
pub struct ProviderMeta {
    pub name: String,
    pub label: String,
    pub icon: Option<String>,
    priority: i32,
    exclude: Vec<Regex>,
}

impl ProviderMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            icon: None,
            priority: 0,
            exclude: Vec::new(),
        }
    }

    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        let exclude = cfg
            .exclude
            .iter()
            .map(|pattern| Regex::new(pattern).with_context(|| format!("invalid exclude pattern '{}'", pattern)))
            .collect::<Result<Vec<_>>>()?;

        let name = cfg.name().to_string();
        Ok(Self {
            label: cfg.label.clone().unwrap_or_else(|| name.clone()),
            name,
            icon: cfg.icon.clone(),
            priority: cfg.priority,
            exclude,
        })
    }

    /// Drops excluded items and offsets each item's priority by the
    /// provider's own.
    pub fn finish(&self, items: Vec<MenuItem>) -> Vec<MenuItem> {
        items
            .into_iter()
            .filter(|item| !self.exclude.iter().any(|re| re.is_match(item.display_name())))
            .map(|item| {
                let priority = item.priority() + self.priority;
                item.with_priority(priority)
            })
            .collect()
    }
}

pub fn build_provider(cfg: &ProviderConfig) -> Result<Box<dyn Provider>> {
    let meta = ProviderMeta::from_config(cfg)?;
    let provider: Box<dyn Provider> = match cfg.kind {
        ProviderKind::Desktop => Box::new(desktop::DesktopProvider::new(meta)),
        ProviderKind::Commands => Box::new(commands::CommandProvider::new(meta, cfg.items.clone())),
        ProviderKind::Bookmarks => Box::new(bookmarks::BookmarkProvider::new(meta, cfg.file.clone())),
        ProviderKind::Bin => Box::new(bin::BinProvider::new(meta)),
    };
    Ok(provider)
}
