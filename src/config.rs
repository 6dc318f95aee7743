use serde::Deserialize;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result, bail};
use std::fs;
use tiny_skia::Color;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default)]
    pub terminal: Option<String>,
    /// Close the launcher even when the selected item failed to start.
    #[serde(default = "default_true")]
    pub hide_on_launch_failure: bool,
}

fn default_true() -> bool { true }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            terminal: None,
            hide_on_launch_failure: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub fuzzy_matching: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub min_chars_for_search: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_matching: true,
            case_sensitive: false,
            min_chars_for_search: 0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Desktop,
    Commands,
    Bookmarks,
    Bin,
}

impl ProviderKind {
    pub fn default_name(self) -> &'static str {
        match self {
            ProviderKind::Desktop => "applications",
            ProviderKind::Commands => "commands",
            ProviderKind::Bookmarks => "bookmarks",
            ProviderKind::Bin => "binaries",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub name: Option<String>,
    pub label: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub priority: i32,
    /// Regexes matched against display names; matching items are dropped.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Static entries for `commands` providers.
    #[serde(default)]
    pub items: Vec<StaticEntry>,
    /// Backing file for `bookmarks` providers.
    pub file: Option<PathBuf>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            name: None,
            label: None,
            icon: None,
            priority: 0,
            exclude: Vec::new(),
            items: Vec::new(),
            file: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.default_name())
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::new(ProviderKind::Desktop)]
}

#[derive(Deserialize, Debug, Clone)]
pub struct StaticEntry {
    pub name: String,
    pub command: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub terminal: bool,
    pub priority: Option<i32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThemeConfig {
    /// Surface width; unset means "span the output".
    #[serde(default)]
    pub width: Option<u32>,
    /// Height of the search header.
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_item_height")]
    pub item_height: u32,
    #[serde(default = "default_max_visible_items")]
    pub max_visible_items: usize,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_selected_background")]
    pub selected_background: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_description_font_size")]
    pub description_font_size: f32,
    #[serde(default = "default_true")]
    pub show_tabs: bool,
    #[serde(default = "default_tab_height")]
    pub tab_height: u32,
    #[serde(default = "default_tab_padding")]
    pub tab_padding: f32,
    #[serde(default = "default_tab_background")]
    pub tab_background: String,
    #[serde(default = "default_tab_active_background")]
    pub tab_active_background: String,
    #[serde(default = "default_text")]
    pub tab_text: String,
}

fn default_height() -> u32 { 48 }
fn default_item_height() -> u32 { 44 }
fn default_max_visible_items() -> usize { 8 }
fn default_padding() -> f32 { 12.0 }
fn default_border_radius() -> f32 { 8.0 }
fn default_icon_size() -> u32 { 28 }
fn default_background() -> String { "1e1e1eff".to_string() }
fn default_selected_background() -> String { "3c3c50ff".to_string() }
fn default_text() -> String { "e0e0e0ff".to_string() }
fn default_description() -> String { "909090ff".to_string() }
fn default_placeholder() -> String { "646464ff".to_string() }
fn default_placeholder_text() -> String { "Search...".to_string() }
fn default_font_size() -> f32 { 16.0 }
fn default_description_font_size() -> f32 { 12.0 }
fn default_tab_height() -> u32 { 32 }
fn default_tab_padding() -> f32 { 10.0 }
fn default_tab_background() -> String { "262630ff".to_string() }
fn default_tab_active_background() -> String { "3c3c50ff".to_string() }

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: default_height(),
            item_height: default_item_height(),
            max_visible_items: default_max_visible_items(),
            padding: default_padding(),
            border_radius: default_border_radius(),
            icon_size: default_icon_size(),
            background: default_background(),
            selected_background: default_selected_background(),
            text: default_text(),
            description: default_description(),
            placeholder: default_placeholder(),
            placeholder_text: default_placeholder_text(),
            font_family: None,
            font_size: default_font_size(),
            description_font_size: default_description_font_size(),
            show_tabs: true,
            tab_height: default_tab_height(),
            tab_padding: default_tab_padding(),
            tab_background: default_tab_background(),
            tab_active_background: default_tab_active_background(),
            tab_text: default_text(),
        }
    }
}

impl ThemeConfig {
    /// Parses `RRGGBB` or `RRGGBBAA`, with an optional leading `#`.
    pub fn parse_color(hex: &str) -> Result<Color> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            bail!("invalid colour {:?}, expected RRGGBB or RRGGBBAA", hex);
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        let a = if digits.len() == 8 { channel(6)? } else { 255 };

        Ok(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, a))
    }

    fn colors(&self) -> [(&'static str, &str); 8] {
        [
            ("background", self.background.as_str()),
            ("selected_background", self.selected_background.as_str()),
            ("text", self.text.as_str()),
            ("description", self.description.as_str()),
            ("placeholder", self.placeholder.as_str()),
            ("tab_background", self.tab_background.as_str()),
            ("tab_active_background", self.tab_active_background.as_str()),
            ("tab_text", self.tab_text.as_str()),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in self.colors() {
            Self::parse_color(value).with_context(|| format!("theme.{}", key))?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            theme: ThemeConfig::default(),
            search: SearchConfig::default(),
            providers: default_providers(),
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "menubar", "menubar")
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match project_dirs() {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => PathBuf::from("config.toml"),
        },
    };

    if !config_path.exists() {
        log::info!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing {}", config_path.display()))?;
    config.theme.validate()
        .with_context(|| format!("parsing {}", config_path.display()))?;
    Ok(config)
}
