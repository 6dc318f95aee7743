use crate::config::{self, StaticEntry};
use crate::model::MenuItem;
use crate::providers::{Provider, ProviderMeta};
use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use log::{info, debug, warn};

/// Commands listed in the config plus executable scripts from the user's
/// scripts directory.
pub struct CommandProvider {
    meta: ProviderMeta,
    entries: Vec<StaticEntry>,
    scripts_dir: Option<PathBuf>,
}

impl CommandProvider {
    pub fn new(meta: ProviderMeta, entries: Vec<StaticEntry>) -> Self {
        let scripts_dir = config::project_dirs().map(|dirs| dirs.config_dir().join("scripts"));
        Self::with_scripts_dir(meta, entries, scripts_dir)
    }

    pub fn with_scripts_dir(meta: ProviderMeta, entries: Vec<StaticEntry>, scripts_dir: Option<PathBuf>) -> Self {
        Self { meta, entries, scripts_dir }
    }

    fn scan_scripts(&self, items: &mut Vec<MenuItem>) {
        let Some(scripts_dir) = &self.scripts_dir else { return };
        if !scripts_dir.exists() {
            debug!("Scripts directory {:?} does not exist, skipping", scripts_dir);
            return;
        }

        debug!("Scanning scripts in {:?}", scripts_dir);
        let Ok(read_dir) = fs::read_dir(scripts_dir) else { return };
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
            if let Some(item) = MenuItem::program(file_name, &path) {
                items.push(item.with_description(Some(path.to_string_lossy().to_string())));
            }
        }
    }
}

impl Provider for CommandProvider {
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
        let mut items = Vec::new();

        for entry in &self.entries {
            match MenuItem::command(entry.name.clone(), entry.command.clone(), entry.terminal) {
                Some(item) => items.push(
                    item.with_icon(entry.icon.clone())
                        .with_description(entry.description.clone())
                        .with_keywords(entry.keywords.clone())
                        .with_priority(entry.priority.unwrap_or(0)),
                ),
                None => warn!("Skipping command '{}' with empty name", entry.command),
            }
        }

        self.scan_scripts(&mut items);

        info!("CommandProvider '{}': found {} entries", self.meta.name, items.len());
        Ok(self.meta.finish(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, command: &str) -> StaticEntry {
        StaticEntry {
            name: name.to_string(),
            command: command.to_string(),
            icon: None,
            description: None,
            keywords: Vec::new(),
            terminal: false,
            priority: None,
        }
    }

    #[test]
    fn static_entries_and_executable_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("backup.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(dir.path().join("notes.txt"), "not executable").unwrap();

        let mut lock = entry("Lock", "loginctl lock-session");
        lock.priority = Some(4);
        let provider = CommandProvider::with_scripts_dir(
            ProviderMeta::new("commands"),
            vec![lock, entry("", "ignored")],
            Some(dir.path().to_path_buf()),
        );

        let items = provider.load_items().unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.display_name()).collect();
        assert_eq!(names, vec!["Lock", "backup.sh"]);
        assert_eq!(items[0].priority(), 4);
    }

    #[test]
    fn script_names_with_spaces_keep_a_single_argument() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("my backup.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let provider = CommandProvider::with_scripts_dir(
            ProviderMeta::new("commands"),
            Vec::new(),
            Some(dir.path().to_path_buf()),
        );
        let items = provider.load_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].display_name(), "my backup.sh");
        assert_eq!(items[0].command_line(None), vec![script.to_string_lossy().into_owned()]);
    }

    #[test]
    fn missing_scripts_dir_is_not_an_error() {
        let provider = CommandProvider::with_scripts_dir(
            ProviderMeta::new("commands"),
            vec![entry("Reboot", "systemctl reboot")],
            Some(PathBuf::from("/nonexistent/menubar/scripts")),
        );
        assert_eq!(provider.load_items().unwrap().len(), 1);
    }
}
