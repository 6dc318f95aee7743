use crate::model::MenuItem;
use crate::providers::{Provider, ProviderMeta};
use anyhow::Result;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use log::{info, debug};

pub struct BinProvider {
    meta: ProviderMeta,
}

impl BinProvider {
    pub fn new(meta: ProviderMeta) -> Self {
        Self { meta }
    }

    /// Executables found in `path_var`; the first directory wins on
    /// duplicate names, mirroring shell lookup.
    fn scan(&self, path_var: &str) -> Vec<MenuItem> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        for path_str in path_var.split(':') {
            let path = Path::new(path_str);
            if !path.exists() {
                continue;
            }
            debug!("Scanning binaries in {:?}", path);
            let Ok(read_dir) = fs::read_dir(path) else { continue };
            for entry in read_dir.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Ok(metadata) = fs::metadata(&path) else { continue };
                if metadata.permissions().mode() & 0o111 == 0 {
                    continue;
                }
                let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else { continue };
                if !seen.insert(file_name.to_string()) {
                    continue;
                }
                if let Some(item) = MenuItem::program(file_name, &path) {
                    items.push(item);
                }
            }
        }
        items
    }
}

impl Provider for BinProvider {
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
        let items = match env::var("PATH") {
            Ok(path_var) => self.scan(&path_var),
            Err(_) => Vec::new(),
        };
        info!("BinProvider '{}': found {} entries", self.meta.name, items.len());
        Ok(self.meta.finish(items))
    }
}
