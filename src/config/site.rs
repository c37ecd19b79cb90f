//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::store::OrderField;

/// Environment variable overriding `api.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `api.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: SiteLocale,
    pub timezone: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,
    pub languages_dir: String,

    // Content store
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,

    // Date / Time format (date-fns tokens)
    pub date_format: String,
    pub time_format: String,

    // Reading time
    pub words_per_minute: u32,

    // Request-time rendering
    pub revalidate_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: SiteLocale::PtBr,
            timezone: "UTC".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            languages_dir: "languages".to_string(),

            api: ApiConfig::default(),
            navigation: NavigationConfig::default(),

            date_format: "dd MMM yyyy".to_string(),
            time_format: "H:m".to_string(),

            words_per_minute: 200,

            revalidate_secs: 3600,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` when set
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("api endpoint overridden from {}", ENDPOINT_ENV);
            self.api.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("api access token overridden from {}", ACCESS_TOKEN_ENV);
            self.api.access_token = Some(token);
        }
    }

    /// Reject values the renderers cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.words_per_minute == 0 {
            return Err(crate::Error::Config(
                "words_per_minute must be greater than zero".to_string(),
            ));
        }
        if self.api.page_size == 0 || self.api.page_size > 100 {
            return Err(crate::Error::Config(format!(
                "api.page_size must be between 1 and 100, got {}",
                self.api.page_size
            )));
        }
        if self.api.endpoint.trim().is_empty() {
            return Err(crate::Error::Config("api.endpoint is empty".to_string()));
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(crate::Error::Config(format!(
                "unknown timezone {:?}",
                self.timezone
            )));
        }
        Ok(())
    }
}

/// Language used for dates and interface strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteLocale {
    #[serde(rename = "en", alias = "en-US")]
    En,
    #[serde(rename = "pt-BR", alias = "pt")]
    PtBr,
}

impl SiteLocale {
    /// Tag used for the `lang` attribute and language files
    pub fn tag(&self) -> &'static str {
        match self {
            SiteLocale::En => "en",
            SiteLocale::PtBr => "pt-BR",
        }
    }

    /// Matching chrono locale for month names
    pub fn chrono_locale(&self) -> chrono::Locale {
        match self {
            SiteLocale::En => chrono::Locale::en_US,
            SiteLocale::PtBr => chrono::Locale::pt_BR,
        }
    }
}

/// Content store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 20,
            timeout_secs: 30,
        }
    }
}

/// Previous/next navigation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub previous_ordering: OrderField,
    pub next_ordering: OrderField,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            previous_ordering: OrderField::FirstPublicationDate,
            next_ordering: OrderField::LastPublicationDate,
        }
    }
}
