use crate::error::LauncherError;
use crate::model::MenuItem;
use crate::providers::Provider;
use log::{debug, info, warn};

/// Display identity of one provider in the tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub label: String,
    pub icon: Option<String>,
}

/// Owns the registered providers, keyed by name, and tracks which one is
/// the active tab.
///
/// With more than one provider the registry behaves as mutually exclusive
/// tabs: only the active provider contributes items.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
    active: usize,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, provider: Box<dyn Provider>) -> Result<(), LauncherError> {
        if self.position(provider.name()).is_some() {
            return Err(LauncherError::DuplicateProvider(provider.name().to_string()));
        }
        info!("Registered provider '{}'", provider.name());
        self.providers.push(provider);
        Ok(())
    }

    /// Removes the named provider and hands it back to the caller.
    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Provider>, LauncherError> {
        let index = self
            .position(name)
            .ok_or_else(|| LauncherError::UnknownProvider(name.to_string()))?;
        let provider = self.providers.remove(index);

        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        info!("Removed provider '{}', active tab is now {}", name, self.active);
        Ok(provider)
    }

    pub fn clear(&mut self) {
        self.providers.clear();
        self.active = 0;
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn is_multi(&self) -> bool {
        self.providers.len() > 1
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_name(&self) -> Option<&str> {
        self.providers.get(self.active).map(|p| p.name())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.name() == name)
    }

    /// Returns whether the active tab changed.
    pub fn set_active(&mut self, index: usize) -> bool {
        if !self.is_multi() || index >= self.providers.len() || index == self.active {
            return false;
        }
        self.active = index;
        true
    }

    /// Moves the active tab by `delta`, wrapping around.
    pub fn cycle(&mut self, delta: i32) -> bool {
        if !self.is_multi() {
            return false;
        }
        let len = self.providers.len() as i32;
        let next = (self.active as i32 + delta).rem_euclid(len) as usize;
        self.set_active(next)
    }

    /// One tab per provider in registration order; empty unless more than
    /// one provider is registered.
    pub fn tabs(&self) -> Vec<Tab> {
        if !self.is_multi() {
            return Vec::new();
        }
        self.providers
            .iter()
            .map(|p| Tab {
                label: p.tab_label().to_string(),
                icon: p.tab_icon().map(str::to_string),
            })
            .collect()
    }

    /// Refreshes the providers that support it. When `name` is given only
    /// that provider is refreshed.
    pub fn refresh(&mut self, name: Option<&str>) {
        for provider in self.providers.iter_mut() {
            if !provider.supports_live_updates() || name.is_some_and(|n| n != provider.name()) {
                continue;
            }
            if let Err(e) = provider.refresh() {
                warn!("Provider '{}' failed to refresh: {:#}", provider.name(), e);
            }
        }
    }

    /// Collects items from every provider, or only the active one when in
    /// tab mode, sorted by priority (descending) then display name.
    pub fn aggregate(&self) -> Vec<MenuItem> {
        let sources: &[Box<dyn Provider>] = if self.is_multi() {
            &self.providers[self.active..=self.active]
        } else {
            &self.providers
        };

        let mut items = Vec::new();
        for provider in sources {
            match provider.load_items() {
                Ok(mut loaded) => {
                    debug!("Provider '{}' contributed {} items", provider.name(), loaded.len());
                    items.append(&mut loaded);
                }
                Err(e) => warn!("Provider '{}' failed to load items: {:#}", provider.name(), e),
            }
        }
        sort_items(&mut items);
        items
    }
}

pub fn sort_items(items: &mut [MenuItem]) {
    items.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.display_name().cmp(b.display_name()))
    });
}
