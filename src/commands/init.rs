//! Initialize a new spacetraveling site

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::templates::{GLOBAL_CSS, LOGO_SVG};
use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
language: pt-BR
timezone: UTC

# Directory
public_dir: public
static_dir: static
languages_dir: languages

# Content store
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these when set
api:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  # access_token: ''
  document_type: posts
  page_size: 20
  timeout_secs: 30

# Previous/next links, ordered after the current post by these fields
navigation:
  previous_ordering: first_publication_date
  next_ordering: last_publication_date

# Date / Time format (date-fns tokens)
date_format: dd MMM yyyy
time_format: H:m

# Reading time
words_per_minute: 200

# Seconds a rendered page is served before it is rendered again
revalidate_secs: 3600
"#;

const LANGUAGES_README: &str = r#"Drop `en.yml` or `pt-BR.yml` here to override interface strings, e.g.

    home:
      load_more: Mais posts
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }

    // Create directory structure
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("static/styles"))?;
    fs::create_dir_all(target_dir.join("static/images"))?;
    fs::create_dir_all(target_dir.join("languages"))?;

    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::write(target_dir.join("static/styles/global.css"), GLOBAL_CSS)?;
    fs::write(target_dir.join("static/images/Logo.svg"), LOGO_SVG)?;
    fs::write(target_dir.join("languages/README.md"), LANGUAGES_README)?;

    Ok(())
}
