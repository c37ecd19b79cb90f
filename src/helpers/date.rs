//! Date helper functions

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::{SiteConfig, SiteLocale};
use crate::error::{Error, Result};

/// A publication instant as delivered by the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Parse `2021-03-25T19:25:28+0000` or any RFC 3339 value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
            .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
            .map(Timestamp)
    }

    /// Same instant written with the same UTC offset
    ///
    /// `==` compares instants only, so `00:00Z` equals `03:00+03:00`.
    pub fn is_identical(&self, other: &Timestamp) -> bool {
        self.0 == other.0 && self.0.offset() == other.0.offset()
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Timestamp(value)
    }
}

/// Format a timestamp in ISO 8601 / XML format
pub fn date_xml(ts: &Timestamp) -> String {
    ts.0.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Formats timestamps in the site's locale and time zone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: SiteLocale,
    tz: Tz,
    date_pattern: String,
    time_pattern: String,
}

impl DateFormatter {
    /// Patterns use date-fns tokens, e.g. `dd MMM yyyy`
    pub fn new(locale: SiteLocale, timezone: &str, date_format: &str, time_format: &str) -> Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone {:?}", timezone)))?;
        Ok(Self {
            locale,
            tz,
            date_pattern: date_fns_to_chrono(date_format),
            time_pattern: date_fns_to_chrono(time_format),
        })
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(
            config.language,
            &config.timezone,
            &config.date_format,
            &config.time_format,
        )
    }

    /// Date part, `25 mar 2021` with the default pattern
    pub fn date(&self, ts: &Timestamp) -> String {
        self.render(ts, &self.date_pattern)
    }

    /// Time part, `19:25` with the default pattern
    pub fn time(&self, ts: &Timestamp) -> String {
        self.render(ts, &self.time_pattern)
    }

    fn render(&self, ts: &Timestamp, chrono_pattern: &str) -> String {
        ts.0.with_timezone(&self.tz)
            .format_localized(chrono_pattern, self.locale.chrono_locale())
            .to_string()
    }
}

/// date-fns tokens, longest first within each letter
const TOKENS: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("YYYY", "%Y"),
    ("yy", "%y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("dd", "%d"),
    ("DD", "%d"),
    ("d", "%-d"),
    ("EEEE", "%A"),
    ("EEE", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("a", "%p"),
    ("xxx", "%:z"),
];

/// Convert a date-fns format string to a chrono one
///
/// Text between single quotes is copied literally (`''` is a quote).
/// Letters that are not tokens pass through unchanged.
pub fn date_fns_to_chrono(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while let Some(c) = rest.chars().next() {
        if c == '\'' {
            if let Some(after) = rest.strip_prefix("''") {
                out.push('\'');
                rest = after;
                continue;
            }
            let body = &rest[1..];
            let end = body.find('\'').unwrap_or(body.len());
            push_literal(&mut out, &body[..end]);
            rest = body.get(end + 1..).unwrap_or("");
            continue;
        }

        for (token, chrono) in TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                out.push_str(chrono);
                rest = after;
                continue 'outer;
            }
        }

        push_literal(&mut out, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}
