//! Reading time and edit status of a post

use serde::Serialize;

use super::post::PostDetail;
use crate::helpers::{word_count, DateFormatter};
use crate::i18n::I18n;

/// Default reading speed
pub const WORDS_PER_MINUTE: u32 = 200;

/// Display data derived from a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingMeta {
    pub reading_time_minutes: u32,
    pub is_edited: bool,
    pub edited_label: Option<String>,
}

/// Words in every heading and body block of the post
pub fn total_words(detail: &PostDetail) -> usize {
    detail
        .content
        .iter()
        .map(|section| {
            word_count(&section.heading)
                + section
                    .body
                    .iter()
                    .map(|block| word_count(&block.text))
                    .sum::<usize>()
        })
        .sum()
}

/// Minutes to read `words` at `words_per_minute`, rounded up
pub fn reading_time(words: usize, words_per_minute: u32) -> u32 {
    let wpm = words_per_minute.max(1) as usize;
    words.div_ceil(wpm) as u32
}

/// Whether the post was republished after its first publication
///
/// The two stamps must carry the same value, offset included; the same
/// instant written in another offset counts as edited.
pub fn is_edited(detail: &PostDetail) -> bool {
    match (&detail.first_publication_date, &detail.last_publication_date) {
        (Some(first), Some(last)) => !first.is_identical(last),
        (None, None) => false,
        _ => true,
    }
}

/// Derives reading time and edit label for posts
pub struct PostDeriver<'a> {
    dates: &'a DateFormatter,
    i18n: &'a I18n,
    words_per_minute: u32,
}

impl<'a> PostDeriver<'a> {
    pub fn new(dates: &'a DateFormatter, i18n: &'a I18n, words_per_minute: u32) -> Self {
        Self {
            dates,
            i18n,
            words_per_minute,
        }
    }

    pub fn derive(&self, detail: &PostDetail) -> ReadingMeta {
        let edited = is_edited(detail);
        let edited_label = if edited {
            detail.last_publication_date.as_ref().map(|last| {
                self.i18n.format(
                    "post.edited_on",
                    &[
                        ("date", self.dates.date(last).as_str()),
                        ("time", self.dates.time(last).as_str()),
                    ],
                )
            })
        } else {
            None
        };

        ReadingMeta {
            reading_time_minutes: reading_time(total_words(detail), self.words_per_minute),
            is_edited: edited,
            edited_label,
        }
    }
}
