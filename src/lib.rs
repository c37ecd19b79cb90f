//! spacetraveling: a blog rendered from a headless content store
//!
//! Posts are fetched from a Prismic-style document API, normalised into
//! typed models and rendered with embedded Tera templates, either to a
//! static site or on request by the built-in server.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pagination;
pub mod server;
pub mod store;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

/// Site configuration file, relative to the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// The main application
#[derive(Debug, Clone)]
pub struct Spacetraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied into the output or served as-is
    pub static_dir: PathBuf,
    /// Interface string overrides
    pub languages_dir: PathBuf,
}

impl Spacetraveling {
    /// Load `_config.yml` from a directory, apply environment overrides
    /// and validate the result
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE, base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();
        config.validate()?;

        Ok(Self::with_config(base_dir, config))
    }

    /// Build an application from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let languages_dir = base_dir.join(&config.languages_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            languages_dir,
        }
    }

    /// Interface strings for the configured language, with site overrides
    pub fn i18n(&self) -> anyhow::Result<i18n::I18n> {
        let mut i18n = i18n::I18n::new(self.config.language);
        i18n.load_languages(&self.languages_dir)?;
        Ok(i18n)
    }

    pub fn site_renderer(&self) -> anyhow::Result<generator::SiteRenderer> {
        Ok(generator::SiteRenderer::new(&self.config, self.i18n()?)?)
    }

    /// HTTP client for the configured content store
    pub fn client(&self) -> Result<store::PrismicClient> {
        store::PrismicClient::new(&self.config.api)
    }

    /// Generate the static site
    pub async fn generate(&self) -> anyhow::Result<generator::GenerateStats> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_with_config_paths() {
        let mut config = config::SiteConfig::default();
        config.public_dir = "out".to_string();
        let app = Spacetraveling::with_config("/site", config);
        assert_eq!(app.public_dir, PathBuf::from("/site/out"));
        assert_eq!(app.static_dir, PathBuf::from("/site/static"));
        assert_eq!(app.languages_dir, PathBuf::from("/site/languages"));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "words_per_minute: 0\n").unwrap();
        assert!(Spacetraveling::new(dir.path()).is_err());
    }

    #[test]
    fn test_site_renderer_uses_language_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let app = Spacetraveling::with_config(dir.path(), config::SiteConfig::default());
        fs::create_dir_all(&app.languages_dir).unwrap();
        fs::write(
            app.languages_dir.join("pt-BR.yml"),
            "not_found:\n  title: Nada aqui\n",
        )
        .unwrap();

        let html = app.site_renderer().unwrap().render_not_found(false).unwrap();
        assert!(html.contains("Nada aqui"));
    }
}
