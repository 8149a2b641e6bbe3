use crate::config::BLOOD_TIME_FORMAT;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

// One or more leading "[week<N>]" tags, with the whitespace after each
static WEEK_PREFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:\[week\d+\]\s*)+").unwrap());

/// Remove leading `[week<N>]` tags from a title. Titles without the tag are
/// returned unchanged, and stripping twice equals stripping once.
pub fn strip_week_prefix(title: &str) -> &str {
    match WEEK_PREFIX_REGEX.find(title) {
        Some(m) => &title[m.end()..],
        None => title,
    }
}

/// A user-typed search pattern, compiled eagerly on every change.
#[derive(Debug, Clone, Default)]
pub enum SearchPattern {
    /// Nothing typed (or only whitespace).
    #[default]
    Absent,
    Valid(Regex),
    /// The text does not compile; filtering behaves as if it were absent.
    Invalid { text: String, reason: String },
}

impl SearchPattern {
    /// Compile `text` as a case-insensitive regular expression.
    ///
    /// # Examples
    /// ```
    /// use flagboard::utils::SearchPattern;
    /// assert!(SearchPattern::compile("  ").is_absent());
    /// assert!(SearchPattern::compile("^intro$").is_match("INTRO"));
    /// assert!(SearchPattern::compile("([").is_invalid());
    /// ```
    pub fn compile(text: &str) -> SearchPattern {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SearchPattern::Absent;
        }
        match RegexBuilder::new(trimmed).case_insensitive(true).build() {
            Ok(re) => SearchPattern::Valid(re),
            Err(e) => SearchPattern::Invalid {
                text: trimmed.to_string(),
                reason: e.to_string(),
            },
        }
    }

    pub fn regex(&self) -> Option<&Regex> {
        match self {
            SearchPattern::Valid(re) => Some(re),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SearchPattern::Absent)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, SearchPattern::Invalid { .. })
    }

    /// True when the pattern is valid and matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_some_and(|re| re.is_match(text))
    }
}

/// Outcome of applying a search pattern, used for the input hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchStatus {
    Inactive,
    Matched,
    /// Valid pattern without hits; the unsearched set is shown instead.
    NoMatch,
    /// Pattern does not compile; the unsearched set is shown.
    Invalid,
}

impl SearchStatus {
    pub fn is_error(self) -> bool {
        matches!(self, SearchStatus::NoMatch | SearchStatus::Invalid)
    }
}

/// Narrow `items` to those whose key matches `pattern`. When nothing
/// matches, or the pattern is absent or invalid, the input is kept whole.
pub fn search_with_fallback<'a, T, F>(
    items: Vec<&'a T>,
    pattern: &SearchPattern,
    key: F,
) -> (Vec<&'a T>, SearchStatus)
where
    F: Fn(&T) -> &str,
{
    let re = match pattern {
        SearchPattern::Absent => return (items, SearchStatus::Inactive),
        SearchPattern::Invalid { .. } => return (items, SearchStatus::Invalid),
        SearchPattern::Valid(re) => re,
    };

    let hits: Vec<&T> = items.iter().copied().filter(|t| re.is_match(key(*t))).collect();
    if hits.is_empty() {
        (items, SearchStatus::NoMatch)
    } else {
        (hits, SearchStatus::Matched)
    }
}

/// Format a submission timestamp the way blood tooltips show it.
pub fn format_submit_time(time: &DateTime<Utc>) -> String {
    time.format(BLOOD_TIME_FORMAT).to_string()
}
