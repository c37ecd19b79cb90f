//! Internationalization (i18n) support
//!
//! Interface strings ship embedded for `en` and `pt-BR`. A site may
//! override any key by dropping `en.yml` / `pt-BR.yml` (or `.json`) into
//! its languages directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::SiteLocale;

const EN: &str = include_str!("languages/en.yml");
const PT_BR: &str = include_str!("languages/pt-BR.yml");

/// Internationalization handler
pub struct I18n {
    /// Current language
    locale: SiteLocale,
    /// Language data: lang -> key -> translation
    translations: HashMap<SiteLocale, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the embedded catalogs
    pub fn new(locale: SiteLocale) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in [(SiteLocale::En, EN), (SiteLocale::PtBr, PT_BR)] {
            match serde_yaml::from_str(source) {
                Ok(data) => {
                    translations.insert(lang, data);
                }
                Err(e) => tracing::error!("Embedded {} catalog is invalid: {}", lang.tag(), e),
            }
        }
        Self {
            locale,
            translations,
        }
    }

    /// Load override files from a directory
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yml") | Some("yaml") | Some("json")) {
                continue;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let lang = match stem {
                "en" => SiteLocale::En,
                "pt-BR" | "pt" => SiteLocale::PtBr,
                _ => {
                    tracing::debug!("Skipping language file {:?}", path);
                    continue;
                }
            };

            let content = fs::read_to_string(&path)?;

            // Try to parse, skip invalid files
            let data: Option<HashMap<String, serde_yaml::Value>> = if ext == Some("json") {
                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(json) => Some(convert_json_to_yaml(json)),
                    Err(e) => {
                        tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                        None
                    }
                }
            } else {
                match serde_yaml::from_str(&content) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                        None
                    }
                }
            };

            if let Some(data) = data {
                let flat = flatten(&data);
                let target = self.translations.entry(lang).or_default();
                for (key, value) in flat {
                    set_nested_value(target, &key, serde_yaml::Value::String(value));
                }
                tracing::debug!("Loaded language file: {:?}", path);
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn locale(&self) -> SiteLocale {
        self.locale
    }

    /// Get a translation by key, e.g. `home.load_more`
    ///
    /// Falls back to English, then to the key itself.
    pub fn get(&self, key: &str) -> String {
        if let Some(value) = self.lookup(self.locale, key) {
            return value;
        }
        if self.locale != SiteLocale::En {
            if let Some(value) = self.lookup(SiteLocale::En, key) {
                return value;
            }
        }
        key.to_string()
    }

    /// Get a translation and fill its `{name}` placeholders
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.get(key);
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    /// Check if a translation exists for the current language
    pub fn has(&self, key: &str) -> bool {
        self.lookup(self.locale, key).is_some()
    }

    /// All translations for the current language with dot-notation keys,
    /// English filling the gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = self
            .translations
            .get(&self.locale)
            .map(flatten)
            .unwrap_or_default();

        if self.locale != SiteLocale::En {
            if let Some(en) = self.translations.get(&SiteLocale::En) {
                for (k, v) in flatten(en) {
                    result.entry(k).or_insert(v);
                }
            }
        }

        result
    }

    /// All translations as a nested object, for template contexts
    pub fn catalog(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for (key, value) in self.get_all_translations() {
            let parts: Vec<&str> = key.split('.').collect();
            insert_nested(&mut root, &parts, value);
        }
        serde_json::Value::Object(root)
    }

    fn lookup(&self, lang: SiteLocale, key: &str) -> Option<String> {
        let data = self.translations.get(&lang)?;
        get_nested_value(data, key).map(yaml_value_to_string)
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(
    data: &'a HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?);

    for part in parts {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => {
                current = map.get(serde_yaml::Value::String(part.to_string()));
            }
            _ => return None,
        }
    }

    current
}

/// Insert a value at a dot-notation key, creating intermediate maps
fn set_nested_value(
    data: &mut HashMap<String, serde_yaml::Value>,
    key: &str,
    value: serde_yaml::Value,
) {
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return,
    };

    if parents.is_empty() {
        data.insert(last.to_string(), value);
        return;
    }

    let root = data
        .entry(parents[0].to_string())
        .or_insert_with(|| serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
    let mut current = root;
    for part in &parents[1..] {
        if !current.is_mapping() {
            *current = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        }
        let Some(map) = current.as_mapping_mut() else {
            return;
        };
        current = map
            .entry(serde_yaml::Value::String(part.to_string()))
            .or_insert_with(|| serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
    }
    if !current.is_mapping() {
        *current = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
    }
    if let Some(map) = current.as_mapping_mut() {
        map.insert(serde_yaml::Value::String(last.to_string()), value);
    }
}

fn insert_nested(
    map: &mut serde_json::Map<String, serde_json::Value>,
    parts: &[&str],
    value: String,
) {
    match parts {
        [] => {}
        [last] => {
            map.insert(last.to_string(), serde_json::Value::String(value));
        }
        [first, rest @ ..] => {
            let entry = map
                .entry(first.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if !entry.is_object() {
                *entry = serde_json::Value::Object(serde_json::Map::new());
            }
            if let serde_json::Value::Object(child) = entry {
                insert_nested(child, rest, value);
            }
        }
    }
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

fn flatten(data: &HashMap<String, serde_yaml::Value>) -> HashMap<String, String> {
    let mut result = HashMap::new();
    flatten_translations(data, "", &mut result);
    result
}

/// Flatten translations into a HashMap with dot-notation keys
fn flatten_translations(
    data: &HashMap<String, serde_yaml::Value>,
    prefix: &str,
    result: &mut HashMap<String, String>,
) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::Mapping(map) => {
                let nested: HashMap<String, serde_yaml::Value> = map
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            serde_yaml::Value::Sequence(_) | serde_yaml::Value::Tagged(_) => {}
            scalar => {
                result.insert(full_key, yaml_value_to_string(scalar));
            }
        }
    }
}

/// Convert JSON value to YAML HashMap
fn convert_json_to_yaml(json: serde_json::Value) -> HashMap<String, serde_yaml::Value> {
    let mut result = HashMap::new();

    if let serde_json::Value::Object(obj) = json {
        for (key, value) in obj {
            result.insert(key, json_value_to_yaml(value));
        }
    }

    result
}

fn json_value_to_yaml(json: serde_json::Value) -> serde_yaml::Value {
    match json {
        serde_json::Value::Null => serde_yaml::Value::Null,
        serde_json::Value::Bool(b) => serde_yaml::Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(f) = n.as_f64() {
                serde_yaml::Value::Number(serde_yaml::Number::from(f))
            } else {
                serde_yaml::Value::Null
            }
        }
        serde_json::Value::String(s) => serde_yaml::Value::String(s),
        serde_json::Value::Array(arr) => {
            serde_yaml::Value::Sequence(arr.into_iter().map(json_value_to_yaml).collect())
        }
        serde_json::Value::Object(obj) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in obj {
                map.insert(serde_yaml::Value::String(k), json_value_to_yaml(v));
            }
            serde_yaml::Value::Mapping(map)
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(SiteLocale::PtBr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalogs() {
        let pt = I18n::new(SiteLocale::PtBr);
        assert_eq!(pt.get("home.load_more"), "Carregar mais posts");
        assert_eq!(pt.get("preview.exit"), "Sair do modo Preview");

        let en = I18n::new(SiteLocale::En);
        assert_eq!(en.get("home.load_more"), "Load more posts");
        assert_eq!(en.get("unknown.key"), "unknown.key");
        assert!(en.has("post.edited_on"));
    }

    #[test]
    fn test_format_placeholders() {
        let en = I18n::new(SiteLocale::En);
        assert_eq!(en.format("post.read_time", &[("minutes", "4")]), "4 min");
    }

    #[test]
    fn test_language_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt-BR.yml"),
            "home:\n  load_more: Mais posts\nextra: Novo\n",
        )
        .unwrap();
        fs::write(dir.path().join("en.json"), r#"{"post": {"next": "Newer"}}"#).unwrap();
        fs::write(dir.path().join("fr.yml"), "home:\n  load_more: Plus\n").unwrap();

        let mut i18n = I18n::new(SiteLocale::PtBr);
        i18n.load_languages(dir.path()).unwrap();

        assert_eq!(i18n.get("home.load_more"), "Mais posts");
        assert_eq!(i18n.get("home.title"), "Home");
        assert_eq!(i18n.get("extra"), "Novo");

        let all = i18n.get_all_translations();
        assert_eq!(all.get("post.previous"), Some(&"Post anterior".to_string()));
        assert_eq!(all.get("extra"), Some(&"Novo".to_string()));
    }

    #[test]
    fn test_catalog_is_nested() {
        let catalog = I18n::new(SiteLocale::En).catalog();
        assert_eq!(catalog["home"]["load_more"], "Load more posts");
        assert_eq!(catalog["post"]["read_time"], "{minutes} min");
    }

    #[test]
    fn test_missing_key_falls_back_to_english() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.yml"), "only_en: English only\n").unwrap();

        let mut i18n = I18n::new(SiteLocale::PtBr);
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("only_en"), "English only");
    }
}
