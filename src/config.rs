//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root next to `site.toml` and is sparse: stock defaults are the
//! base layer and the user's file only overrides what it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_name = "rackpress"
//! base_url = "/"
//!
//! [banner]
//! # image = "masthead"      # Image name shown above every page
//!
//! [menus]
//! main_level = 1000         # Menus at or above this level are main menus
//!
//! [iframe]
//! allowed_sources = []      # URL prefixes articles may embed
//! default_height = "600px"
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#1a1a1a"
//! text_muted = "#5f5f5f"
//! border = "#dddddd"
//! link = "#1f4e8c"
//! link_hover = "#0b2a55"
//!
//! [colors.dark]
//! background = "#111418"
//! text = "#e8e8e8"
//! text_muted = "#9a9a9a"
//! border = "#2c3036"
//! link = "#8fb5ea"
//! link_hover = "#c9dcf7"
//!
//! [processing]
//! max_processes = 4         # Max parallel page renderers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Shown in the `<title>` of every generated page.
    pub site_name: String,
    /// Prefix for absolute links (`/` for root deployments).
    pub base_url: String,
    pub banner: BannerConfig,
    pub menus: MenusConfig,
    pub iframe: IframeConfig,
    pub colors: ColorConfig,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "rackpress".to_string(),
            base_url: "/".to_string(),
            banner: BannerConfig::default(),
            menus: MenusConfig::default(),
            iframe: IframeConfig::default(),
            colors: ColorConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with('/') || self.base_url.starts_with("http")) {
            return Err(ConfigError::Validation(
                "base_url must start with '/' or 'http'".into(),
            ));
        }
        if self.menus.main_level < 0 {
            return Err(ConfigError::Validation(
                "menus.main_level must not be negative".into(),
            ));
        }
        if self.iframe.default_height.trim().is_empty() {
            return Err(ConfigError::Validation(
                "iframe.default_height must not be empty".into(),
            ));
        }
        if self.iframe.allowed_sources.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "iframe.allowed_sources entries must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Join `base_url` and a site-relative path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Optional image shown above every page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BannerConfig {
    /// `name` of an image record in the store.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenusConfig {
    /// Menus whose level is at or above this value appear on every page.
    pub main_level: i32,
}

impl Default for MenusConfig {
    fn default() -> Self {
        Self { main_level: 1000 }
    }
}

/// Iframe embedding rules for articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IframeConfig {
    /// URL prefixes an article's `iframe_src` must start with.
    /// Empty means no external embeds at all.
    pub allowed_sources: Vec<String>,
    /// CSS height used when neither the article nor its src names one.
    pub default_height: String,
}

impl Default for IframeConfig {
    fn default() -> Self {
        Self {
            allowed_sources: Vec::new(),
            default_height: "600px".to_string(),
        }
    }
}

/// Parallel rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of pages rendered concurrently.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Article meta, menus, comment timestamps.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1a1a1a".to_string(),
            text_muted: "#5f5f5f".to_string(),
            border: "#dddddd".to_string(),
            link: "#1f4e8c".to_string(),
            link_hover: "#0b2a55".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#111418".to_string(),
            text: "#e8e8e8".to_string(),
            text_muted: "#9a9a9a".to_string(),
            border: "#2c3036".to_string(),
            link: "#8fb5ea".to_string(),
            link_hover: "#c9dcf7".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(site_name = %config.site_name, "loaded site config");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rackpress configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Shown in the <title> of every page.
site_name = "rackpress"

# Prefix for absolute links. Use "/" when the site is served from the root.
base_url = "/"

# ---------------------------------------------------------------------------
# Banner
# ---------------------------------------------------------------------------
[banner]
# Name of an image in site.toml to show above every page.
# image = "masthead"

# ---------------------------------------------------------------------------
# Menus
# ---------------------------------------------------------------------------
[menus]
# Menus with a level at or above this value are shown on every page.
# Other menus only show on the pages they are attached to.
main_level = 1000

# ---------------------------------------------------------------------------
# Iframes
# ---------------------------------------------------------------------------
[iframe]
# URL prefixes an article's iframe_src may start with. Anything else is
# dropped at build time. Documents from the media directory are always allowed.
allowed_sources = []

# CSS height for iframes that don't specify one.
default_height = "600px"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1a1a1a"
text_muted = "#5f5f5f"    # Article meta, menus, comment timestamps
border = "#dddddd"
link = "#1f4e8c"
link_hover = "#0b2a55"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#111418"
text = "#e8e8e8"
text_muted = "#9a9a9a"
border = "#2c3036"
link = "#8fb5ea"
link_hover = "#c9dcf7"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum pages rendered in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    let vars = |scheme: &ColorScheme, pad: &str| {
        [
            ("bg", &scheme.background),
            ("text", &scheme.text),
            ("text-muted", &scheme.text_muted),
            ("border", &scheme.border),
            ("link", &scheme.link),
            ("link-hover", &scheme.link_hover),
        ]
        .iter()
        .map(|(name, value)| format!("{pad}--color-{name}: {value};"))
        .collect::<Vec<_>>()
        .join("\n")
    };
    format!(
        ":root {{\n{}\n}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}\n    }}\n}}",
        vars(&colors.light, "    "),
        vars(&colors.dark, "        "),
    )
}
