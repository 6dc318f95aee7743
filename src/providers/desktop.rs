use crate::model::MenuItem;
use crate::providers::{Provider, ProviderMeta};
use anyhow::Result;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use directories::BaseDirs;
use log::{info, debug};
use walkdir::WalkDir;

pub struct DesktopProvider {
    meta: ProviderMeta,
    dirs: Vec<PathBuf>,
}

impl DesktopProvider {
    pub fn new(meta: ProviderMeta) -> Self {
        Self::with_dirs(meta, application_dirs())
    }

    pub fn with_dirs(meta: ProviderMeta, dirs: Vec<PathBuf>) -> Self {
        Self { meta, dirs }
    }
}

/// `$XDG_DATA_HOME/applications` followed by each `$XDG_DATA_DIRS` entry.
fn application_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(base_dirs) = BaseDirs::new() {
        dirs.push(base_dirs.data_dir().join("applications"));
    }
    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
        dirs.push(Path::new(dir).join("applications"));
    }
    dirs
}

/// Desktop-file id: the path below the applications dir with `/` turned
/// into `-`, so `kde/konsole.desktop` becomes `kde-konsole.desktop`.
fn desktop_id(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('/', "-")
}

impl Provider for DesktopProvider {
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
        let mut seen_ids = HashSet::new();

        for dir in &self.dirs {
            if !dir.exists() {
                continue;
            }
            debug!("Scanning desktop files in {:?}", dir);
            for entry in WalkDir::new(dir).follow_links(true).into_iter().flatten() {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("desktop") {
                    continue;
                }
                // Earlier directories shadow later ones, even when the
                // shadowing entry is hidden.
                if !seen_ids.insert(desktop_id(dir, path)) {
                    continue;
                }
                let Ok(content) = fs::read_to_string(path) else { continue };
                if let Some(item) = parse_desktop_file(&content).and_then(DesktopEntry::into_item) {
                    items.push(item);
                }
            }
        }

        info!("DesktopProvider '{}': found {} entries", self.meta.name, items.len());
        Ok(self.meta.finish(items))
    }
}

#[derive(Debug, Default, PartialEq)]
struct DesktopEntry {
    name: String,
    exec: String,
    terminal: bool,
    icon: Option<String>,
    comment: Option<String>,
    keywords: Vec<String>,
    container: Option<String>,
}

impl DesktopEntry {
    fn into_item(self) -> Option<MenuItem> {
        let display_name = match &self.container {
            Some(c) => format!("{} ({})", self.name, c),
            None => self.name,
        };
        MenuItem::application(display_name, self.exec, self.terminal).map(|item| {
            item.with_icon(self.icon)
                .with_description(self.comment)
                .with_keywords(self.keywords)
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(';').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_desktop_file(content: &str) -> Option<DesktopEntry> {
    let mut name = None;
    let mut exec = None;
    let mut entry = DesktopEntry::default();
    let mut skip = false;
    let mut is_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        if line == "[Desktop Entry]" {
            is_desktop_entry = true;
            continue;
        }

        if line.starts_with('[') {
            is_desktop_entry = false;
            continue;
        }

        if !is_desktop_entry { continue; }

        let Some((key, value)) = line.split_once('=') else { continue };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => {
                let clean_exec: String = value.split_whitespace()
                    .filter(|s| !s.starts_with('%'))
                    .collect::<Vec<_>>()
                    .join(" ");
                exec = Some(clean_exec);
            }
            "Type" => skip |= value != "Application",
            "Terminal" => entry.terminal = value == "true",
            "NoDisplay" | "Hidden" => skip |= value == "true",
            "Icon" => entry.icon = Some(value.to_string()),
            "Comment" => entry.comment = Some(value.to_string()),
            "Categories" | "Keywords" => entry.keywords.extend(split_list(value)),
            _ => {}
        }
    }

    if skip { return None; }

    let exec = exec.filter(|e| !e.is_empty())?;
    entry.container = container_name(&exec);
    entry.name = name?;
    entry.exec = exec;
    Some(entry)
}

/// Name of the distrobox/toolbox container an Exec line enters, if any.
fn container_name(cmd: &str) -> Option<String> {
    let flags: &[&str] = if cmd.contains("distrobox-enter") {
        &["-n", "--name"]
    } else if cmd.contains("toolbox run") {
        &["-c", "--container"]
    } else {
        return None;
    };
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let pos = parts.iter().position(|x| flags.contains(x))?;
    parts.get(pos + 1).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
[Desktop Entry]
Type=Application
Name=Firefox
Name[de]=Feuerfuchs
Comment=Browse the Web
Exec=firefox %u
Icon=firefox
Categories=Network;WebBrowser;
Keywords=web;internet;

[Desktop Action new-window]
Name=New Window
Exec=firefox --new-window
";

    #[test]
    fn parses_main_group_only() {
        let entry = parse_desktop_file(FIREFOX).unwrap();
        assert_eq!(entry.name, "Firefox");
        assert_eq!(entry.exec, "firefox");
        assert_eq!(entry.icon.as_deref(), Some("firefox"));
        assert_eq!(entry.comment.as_deref(), Some("Browse the Web"));
        assert_eq!(entry.keywords, vec!["Network", "WebBrowser", "web", "internet"]);
        assert!(!entry.terminal);
    }

    #[test]
    fn hidden_and_non_application_entries_are_skipped() {
        assert!(parse_desktop_file("[Desktop Entry]\nName=A\nExec=a\nNoDisplay=true\n").is_none());
        assert!(parse_desktop_file("[Desktop Entry]\nName=A\nExec=a\nHidden=true\n").is_none());
        assert!(parse_desktop_file("[Desktop Entry]\nType=Link\nName=A\nExec=a\n").is_none());
        assert!(parse_desktop_file("[Desktop Entry]\nName=A\n").is_none());
    }

    #[test]
    fn container_entries_carry_container_name() {
        let entry = parse_desktop_file(
            "[Desktop Entry]\nName=Code\nExec=distrobox-enter -n dev -- code %F\n",
        )
        .unwrap();
        let item = entry.into_item().unwrap();
        assert_eq!(item.display_name(), "Code (dev)");
    }

    #[test]
    fn earlier_dirs_shadow_later_ones() {
        let user = tempfile::tempdir().unwrap();
        let system = tempfile::tempdir().unwrap();
        fs::create_dir_all(system.path().join("kde")).unwrap();
        fs::write(user.path().join("term.desktop"), "[Desktop Entry]\nName=My Term\nExec=foot\n").unwrap();
        fs::write(system.path().join("term.desktop"), "[Desktop Entry]\nName=Term\nExec=xterm\n").unwrap();
        fs::write(
            system.path().join("kde/konsole.desktop"),
            "[Desktop Entry]\nName=Konsole\nExec=konsole\nTerminal=false\n",
        )
        .unwrap();

        let provider = DesktopProvider::with_dirs(
            ProviderMeta::new("apps"),
            vec![user.path().to_path_buf(), system.path().to_path_buf()],
        );
        let mut names: Vec<String> = provider
            .load_items()
            .unwrap()
            .iter()
            .map(|i| i.display_name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Konsole", "My Term"]);
    }
}
