use std::path::PathBuf;

/// What happens when an item is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAction {
    DesktopApplication {
        exec: String,
        terminal: bool,
    },
    /// A shell-like command line, split on whitespace.
    CustomCommand {
        command: String,
        terminal: bool,
    },
    /// An executable run as-is, never split.
    Program {
        path: PathBuf,
    },
    Bookmark {
        url: String,
    },
}

/// A single selectable entry shown by the launcher.
///
/// Items are immutable once built; the builder-style setters consume
/// `self` and are only meant to be used by providers while constructing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    display_name: String,
    search_keywords: Vec<String>,
    icon_ref: Option<String>,
    description: Option<String>,
    priority: i32,
    action: ItemAction,
}

impl MenuItem {
    /// Returns `None` when `display_name` is empty (after trimming).
    pub fn new(display_name: impl Into<String>, action: ItemAction) -> Option<Self> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return None;
        }
        Some(Self {
            display_name,
            search_keywords: Vec::new(),
            icon_ref: None,
            description: None,
            priority: 0,
            action,
        })
    }

    pub fn application(name: impl Into<String>, exec: impl Into<String>, terminal: bool) -> Option<Self> {
        Self::new(name, ItemAction::DesktopApplication { exec: exec.into(), terminal })
    }

    pub fn command(name: impl Into<String>, command: impl Into<String>, terminal: bool) -> Option<Self> {
        Self::new(name, ItemAction::CustomCommand { command: command.into(), terminal })
    }

    pub fn program(name: impl Into<String>, path: impl Into<PathBuf>) -> Option<Self> {
        Self::new(name, ItemAction::Program { path: path.into() })
    }

    pub fn bookmark(name: impl Into<String>, url: impl Into<String>) -> Option<Self> {
        Self::new(name, ItemAction::Bookmark { url: url.into() })
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.search_keywords = keywords;
        self
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon_ref = icon.filter(|i| !i.is_empty());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn search_keywords(&self) -> &[String] {
        &self.search_keywords
    }

    pub fn icon_ref(&self) -> Option<&str> {
        self.icon_ref.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn action(&self) -> &ItemAction {
        &self.action
    }

    /// Builds the argv used to start this item. `terminal` is the configured
    /// terminal prefix, e.g. `"foot -e"`.
    pub fn command_line(&self, terminal: Option<&str>) -> Vec<String> {
        let (cmd, wants_terminal) = match &self.action {
            ItemAction::DesktopApplication { exec, terminal } => (exec.as_str(), *terminal),
            ItemAction::CustomCommand { command, terminal } => (command.as_str(), *terminal),
            ItemAction::Program { path } => return vec![path.to_string_lossy().into_owned()],
            ItemAction::Bookmark { url } => return vec!["xdg-open".to_string(), url.clone()],
        };

        let mut parts: Vec<String> = Vec::new();
        if wants_terminal {
            if let Some(term_cmd) = terminal {
                parts.extend(term_cmd.split_whitespace().map(str::to_string));
            }
        }
        parts.extend(cmd.split_whitespace().map(str::to_string));
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_display_name_is_rejected() {
        assert!(MenuItem::command("", "true", false).is_none());
        assert!(MenuItem::command("   ", "true", false).is_none());
        assert!(MenuItem::command("ok", "true", false).is_some());
    }

    #[test]
    fn terminal_items_are_wrapped_with_terminal_prefix() {
        let item = MenuItem::application("htop", "htop --tree", true).unwrap();
        assert_eq!(item.command_line(Some("foot -e")), vec!["foot", "-e", "htop", "--tree"]);
        assert_eq!(item.command_line(None), vec!["htop", "--tree"]);
    }

    #[test]
    fn bookmarks_open_with_xdg_open() {
        let item = MenuItem::bookmark("Rust", "https://www.rust-lang.org").unwrap();
        assert_eq!(item.command_line(Some("foot -e")), vec!["xdg-open", "https://www.rust-lang.org"]);
    }

    #[test]
    fn program_paths_are_not_split() {
        let item = MenuItem::program("my backup.sh", "/home/u/.config/menubar/scripts/my backup.sh").unwrap();
        assert_eq!(item.command_line(Some("foot -e")), vec!["/home/u/.config/menubar/scripts/my backup.sh"]);
    }

    #[test]
    fn empty_icon_and_description_are_dropped() {
        let item = MenuItem::command("x", "x", false)
            .unwrap()
            .with_icon(Some(String::new()))
            .with_description(Some(String::new()));
        assert_eq!(item.icon_ref(), None);
        assert_eq!(item.description(), None);
    }
}
