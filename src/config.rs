use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Site conventions and engine limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Content source origin; every href and URL shape is resolved against it.
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Politeness delay between consecutive requests.
    pub request_delay_ms: u64,
    /// Numeric probe window: `[max(1, min - probe_below), min(max + probe_above, probe_hard_cap)]`.
    pub probe_below: u64,
    pub probe_above: u64,
    pub probe_hard_cap: u64,
    /// Left padding, in px, of one catalog tree level.
    pub indent_unit_px: u32,
    /// Volume summaries shorter than this (in chars) are discarded.
    pub min_volume_summary_chars: usize,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.shidianguji.com".to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            request_timeout_secs: 10,
            request_delay_ms: 1500,
            probe_below: 5,
            probe_above: 10,
            probe_hard_cap: 50,
            indent_unit_px: 28,
            min_volume_summary_chars: 100,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&yaml)
            .with_context(|| format!("parse config yaml: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base = url::Url::parse(&self.base_url).context("parse base_url")?;
        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!("base_url must be http/https: {base}");
        }
        if self.indent_unit_px == 0 {
            anyhow::bail!("indent_unit_px must be positive");
        }
        if self.probe_hard_cap == 0 {
            anyhow::bail!("probe_hard_cap must be positive");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn book_url(&self, book: &str) -> String {
        format!("{}/book/{book}", self.origin())
    }

    pub fn chapter_url(&self, book: &str, chapter: &str) -> String {
        format!("{}/book/{book}/chapter/{chapter}", self.origin())
    }

    pub fn chapter_api_url(&self, book: &str, chapter: &str) -> String {
        format!("{}/api/book/{book}/chapter/{chapter}", self.origin())
    }

    /// Candidate chapter-list endpoints, tried in order.
    pub fn listing_endpoints(&self, book: &str) -> Vec<String> {
        let origin = self.origin();
        vec![
            format!("{origin}/api/book/{book}/chapters"),
            format!("{origin}/api/book/{book}/contents"),
            format!("{origin}/api/book/{book}/catalog"),
            format!("{origin}/api/ancientlib/book/{book}/chapters"),
            format!("{origin}/api/v1/book/{book}/chapters"),
            format!("{origin}/api/book/{book}"),
        ]
    }

    /// Resolve an href found on the site against `base_url`.
    pub fn resolve_href(&self, href: &str) -> Option<String> {
        let base = url::Url::parse(&self.base_url).ok()?;
        let mut resolved = base.join(href).ok()?;
        resolved.set_fragment(None);
        Some(resolved.to_string())
    }
}
