//! Tracked site configuration and runtime settings.

use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// The press release page being watched and where to report new releases.
///
/// Persisted as a flat record (`url`, `notify_url`, `date_selector`, `num_links`).
/// Every field has a serde default so that a missing field surfaces as a
/// configuration error from [`TrackedSite::validate`] rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSite {
    /// Press release listing page
    #[serde(default)]
    pub url: String,

    /// Webhook receiving `{"press_release_link": ...}` payloads
    #[serde(default)]
    pub notify_url: String,

    /// CSS selector matching publication dates (empty means unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_selector: Option<String>,

    /// Number of links checked by the positional fallback (`null` means default)
    #[serde(
        default = "defaults::num_links",
        deserialize_with = "defaults::num_links_or_default"
    )]
    pub num_links: usize,
}

impl Default for TrackedSite {
    fn default() -> Self {
        Self {
            url: String::new(),
            notify_url: String::new(),
            date_selector: None,
            num_links: defaults::num_links(),
        }
    }
}

impl TrackedSite {
    /// Load and validate a site from a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if Self::is_missing(path) {
            return Err(AppError::config(format!(
                "config file {} is missing or empty",
                path.display()
            )));
        }

        let site = Self::read(path)?;
        site.validate()?;
        Ok(site)
    }

    /// Load a site without validating it.
    ///
    /// A missing or empty file yields the default (blank) site.
    pub fn load_lenient(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if Self::is_missing(path) {
            return Ok(Self::default());
        }
        Self::read(path)
    }

    /// True when the config file does not exist or has no content.
    pub fn is_missing(path: impl AsRef<Path>) -> bool {
        match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut site = ConfigFormat::from_path(path).parse(&content)?;
        site.normalize();
        Ok(site)
    }

    /// Write the full record to disk (temp file, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rendered = ConfigFormat::from_path(path).render(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, rendered)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Validate required fields.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(AppError::config("'url' is missing or empty"));
        }
        if self.notify_url.trim().is_empty() {
            return Err(AppError::config("'notify_url' is missing or empty"));
        }
        Url::parse(&self.url)
            .map_err(|e| AppError::config(format!("'url' is not a valid URL: {e}")))?;
        Url::parse(&self.notify_url)
            .map_err(|e| AppError::config(format!("'notify_url' is not a valid URL: {e}")))?;
        if self.num_links == 0 {
            return Err(AppError::config("'num_links' must be > 0"));
        }
        Ok(())
    }

    /// The configured date selector, if it is non-empty.
    pub fn date_selector(&self) -> Option<&str> {
        self.date_selector.as_deref()
    }

    /// Apply CLI overrides; unspecified fields keep their current values.
    pub fn apply(&mut self, overrides: &SiteOverrides) {
        if let Some(url) = overrides.url.as_deref().filter(|s| !s.trim().is_empty()) {
            self.url = url.trim().to_string();
        }
        if let Some(notify_url) = overrides
            .notify_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            self.notify_url = notify_url.trim().to_string();
        }
        if let Some(selector) = &overrides.date_selector {
            self.date_selector = Some(selector.clone());
        }
        if let Some(num_links) = overrides.num_links.filter(|n| *n > 0) {
            self.num_links = num_links;
        }
        self.normalize();
    }

    /// Blank date selectors mean "not configured".
    fn normalize(&mut self) {
        self.date_selector = self
            .date_selector
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    /// Ask for every field interactively.
    pub fn prompt<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<Self> {
        let url = ask(
            &mut input,
            &mut output,
            "URL of the press release page to track: ",
        )?;
        let notify_url = ask(&mut input, &mut output, "Webhook URL to notify: ")?;
        let date_selector = ask(
            &mut input,
            &mut output,
            "CSS selector for publication dates (optional): ",
        )?;
        let raw_count = ask(
            &mut input,
            &mut output,
            "Number of links to check if date-based checking fails (default: 50): ",
        )?;

        let num_links = if raw_count.is_empty() {
            defaults::num_links()
        } else {
            match raw_count.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    writeln!(
                        output,
                        "Invalid input, defaulting to {} links.",
                        defaults::num_links()
                    )?;
                    defaults::num_links()
                }
            }
        };

        let mut site = Self {
            url,
            notify_url,
            date_selector: Some(date_selector),
            num_links,
        };
        site.normalize();
        Ok(site)
    }
}

impl fmt::Display for TrackedSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "URL: {}, Notify URL: {}, Date Selector: {}, Links to be checked: {}",
            self.url,
            self.notify_url,
            self.date_selector().unwrap_or("<none>"),
            self.num_links
        )
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Optional replacements for persisted fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteOverrides {
    pub url: Option<String>,
    pub notify_url: Option<String>,
    /// `Some("")` clears the selector.
    pub date_selector: Option<String>,
    pub num_links: Option<usize>,
}

impl SiteOverrides {
    /// True when no field is overridden.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.notify_url.is_none()
            && self.date_selector.is_none()
            && self.num_links.is_none()
    }
}

/// On-disk encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    fn parse(self, content: &str) -> Result<TrackedSite> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
        })
    }

    fn render(self, site: &TrackedSite) -> Result<String> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(site)?,
            Self::Toml => toml::to_string_pretty(site)?,
        })
    }
}

/// HTTP client settings shared by the fetcher and the notifier.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User-Agent header for HTTP requests
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Poll loop behavior.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Seconds to sleep between cycles
    pub delay_secs: u64,

    /// Keep the previous baseline when an extraction yields no links
    pub keep_baseline_on_empty: bool,
}

impl PollSettings {
    /// Pause between cycles. Zero falls back to the default delay.
    pub fn delay(&self) -> Duration {
        match self.delay_secs {
            0 => Duration::from_secs(defaults::delay()),
            secs => Duration::from_secs(secs),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay_secs: defaults::delay(),
            keep_baseline_on_empty: false,
        }
    }
}

pub(crate) mod defaults {
    use serde::{Deserialize, Deserializer};

    pub fn num_links_or_default<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<usize, D::Error> {
        Ok(Option::<usize>::deserialize(deserializer)?.unwrap_or_else(num_links))
    }

    pub fn num_links() -> usize {
        50
    }
    pub fn delay() -> u64 {
        15
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; pressping/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_rejects_empty_notify_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "url = \"https://example.com/press\"\nnotify_url = \"\"\n",
        );

        let err = TrackedSite::load(&path).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn load_rejects_missing_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"notify_url": "https://hooks.example.com/x"}"#,
        );

        assert!(TrackedSite::load(&path).unwrap_err().is_config());
    }

    #[test]
    fn load_passes_optional_fields_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{
                "url": "https://example.com/press",
                "notify_url": "https://hooks.example.com/x",
                "date_selector": "",
                "num_links": 25
            }"#,
        );

        let site = TrackedSite::load(&path).unwrap();
        assert_eq!(site.url, "https://example.com/press");
        assert_eq!(site.notify_url, "https://hooks.example.com/x");
        assert_eq!(site.date_selector(), None);
        assert_eq!(site.num_links, 25);
    }

    #[test]
    fn load_defaults_num_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "url = \"https://example.com/press\"\n\
             notify_url = \"https://hooks.example.com/x\"\n\
             date_selector = \"span.date\"\n",
        );

        let site = TrackedSite::load(&path).unwrap();
        assert_eq!(site.num_links, 50);
        assert_eq!(site.date_selector(), Some("span.date"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrackedSite::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn empty_file_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.toml", "");
        assert!(TrackedSite::is_missing(&path));
        assert_eq!(TrackedSite::load_lenient(&path).unwrap(), TrackedSite::default());
    }

    #[test]
    fn save_then_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let site = TrackedSite {
            url: "https://example.com/press".into(),
            notify_url: "https://hooks.example.com/x".into(),
            date_selector: Some("time".into()),
            num_links: 10,
        };

        site.save(&path).unwrap();
        assert_eq!(TrackedSite::load(&path).unwrap(), site);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn apply_keeps_unspecified_fields() {
        let mut site = TrackedSite {
            url: "https://example.com/press".into(),
            notify_url: "https://hooks.example.com/x".into(),
            date_selector: Some("time".into()),
            num_links: 10,
        };

        site.apply(&SiteOverrides {
            notify_url: Some("https://hooks.example.com/y".into()),
            ..SiteOverrides::default()
        });

        assert_eq!(site.url, "https://example.com/press");
        assert_eq!(site.notify_url, "https://hooks.example.com/y");
        assert_eq!(site.date_selector(), Some("time"));
        assert_eq!(site.num_links, 10);
    }

    #[test]
    fn apply_empty_selector_clears_it() {
        let mut site = TrackedSite {
            date_selector: Some("time".into()),
            ..TrackedSite::default()
        };
        site.apply(&SiteOverrides {
            date_selector: Some(String::new()),
            ..SiteOverrides::default()
        });
        assert_eq!(site.date_selector(), None);
    }

    #[test]
    fn apply_ignores_blank_url_and_zero_links() {
        let mut site = TrackedSite {
            url: "https://example.com/press".into(),
            num_links: 10,
            ..TrackedSite::default()
        };
        site.apply(&SiteOverrides {
            url: Some("  ".into()),
            num_links: Some(0),
            ..SiteOverrides::default()
        });
        assert_eq!(site.url, "https://example.com/press");
        assert_eq!(site.num_links, 10);
    }

    #[test]
    fn validate_rejects_zero_links() {
        let site = TrackedSite {
            url: "https://example.com/press".into(),
            notify_url: "https://hooks.example.com/x".into(),
            date_selector: None,
            num_links: 0,
        };
        assert!(site.validate().is_err());
    }

    #[test]
    fn validate_rejects_relative_url() {
        let site = TrackedSite {
            url: "example.com/press".into(),
            notify_url: "https://hooks.example.com/x".into(),
            ..TrackedSite::default()
        };
        assert!(site.validate().unwrap_err().is_config());
    }

    #[test]
    fn null_num_links_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"url": "https://example.com/press", "notify_url": "https://hooks.example.com/x", "date_selector": "", "num_links": null}"#,
        );

        let site = TrackedSite::load(&path).unwrap();
        assert_eq!(site.num_links, 50);
        assert_eq!(site.date_selector(), None);
    }

    #[test]
    fn poll_delay_zero_uses_default() {
        let settings = PollSettings {
            delay_secs: 0,
            ..PollSettings::default()
        };
        assert_eq!(settings.delay(), Duration::from_secs(15));

        let settings = PollSettings {
            delay_secs: 3,
            ..PollSettings::default()
        };
        assert_eq!(settings.delay(), Duration::from_secs(3));
    }

    #[test]
    fn prompt_reads_answers() {
        let input = Cursor::new(
            "https://example.com/press\nhttps://hooks.example.com/x\n\nabc\n".as_bytes(),
        );
        let mut output = Vec::new();

        let site = TrackedSite::prompt(input, &mut output).unwrap();
        assert_eq!(site.url, "https://example.com/press");
        assert_eq!(site.notify_url, "https://hooks.example.com/x");
        assert_eq!(site.date_selector(), None);
        assert_eq!(site.num_links, 50);
        assert!(String::from_utf8(output).unwrap().contains("defaulting to 50"));
    }
}
