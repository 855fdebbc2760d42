use std::collections::HashMap;

// Upper bound on the number of suffixes tried for a single title.
const MAX_DEDUP_ATTEMPTS: usize = 10_000;

/// Maximum length of the " - <interval>" suffix of a rule group name, over every
/// representable interval. The longest is a twelve-digit count of years followed
/// by all smaller units, as in " - 292471208677y51w6d23h59m59s".
pub const MAX_INTERVAL_SUFFIX_LEN: usize = 30;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DedupError {
    #[error("title {title:?} cannot be made unique: suffix {suffix:?} exceeds the maximum length of {max_len}")]
    NoRoomForSuffix {
        title: String,
        suffix: String,
        max_len: usize,
    },
    #[error("title {title:?} cannot be made unique after {attempts} attempts")]
    Exhausted { title: String, attempts: usize },
}

/// TitleDeduplicator produces rule titles which are unique within a single folder.
///
/// A TitleDeduplicator holds every title it has returned, and is scoped to one
/// folder of one migration run. Each decision depends on all prior decisions,
/// so a TitleDeduplicator must not be shared across folders.
#[derive(Debug)]
pub struct TitleDeduplicator {
    // Keys of titles which are taken, mapped to the last suffix
    // number used to deduplicate that title.
    taken: HashMap<String, usize>,
    case_insensitive: bool,
    max_len: usize,
}

impl TitleDeduplicator {
    pub fn new(max_len: usize, case_insensitive: bool) -> Self {
        Self {
            taken: HashMap::new(),
            case_insensitive,
            max_len,
        }
    }

    /// Mark titles as already taken, such as titles of existing rules in the folder.
    pub fn reserve<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for title in titles {
            let key = self.key(title.as_ref());
            self.taken.entry(key).or_insert(1);
        }
    }

    /// Return `title`, truncated to the maximum title length, if it's not yet taken.
    /// Otherwise, append the next available " #N" suffix, truncating the title further
    /// so that the suffixed title fits.
    pub fn deduplicate(&mut self, title: &str) -> Result<String, DedupError> {
        let base = truncate(title, self.max_len);
        let base_key = self.key(base);

        let last = match self.taken.get(&base_key) {
            None => {
                self.taken.insert(base_key, 1);
                return Ok(base.to_string());
            }
            Some(last) => *last,
        };

        for n in (last + 1)..(last + 1 + MAX_DEDUP_ATTEMPTS) {
            let suffix = format!(" #{n}");

            if suffix.len() > self.max_len {
                return Err(DedupError::NoRoomForSuffix {
                    title: title.to_string(),
                    suffix,
                    max_len: self.max_len,
                });
            }
            let candidate = format!("{}{suffix}", truncate(base, self.max_len - suffix.len()));
            let candidate_key = self.key(&candidate);

            if !self.taken.contains_key(&candidate_key) {
                self.taken.insert(candidate_key, 1);
                self.taken.insert(base_key, n);
                return Ok(candidate);
            }
        }

        Err(DedupError::Exhausted {
            title: title.to_string(),
            attempts: MAX_DEDUP_ATTEMPTS,
        })
    }

    fn key(&self, title: &str) -> String {
        if self.case_insensitive {
            models::collate(title.chars()).collect()
        } else {
            title.to_string()
        }
    }
}

/// Build the name of the rule group of a migrated rule from its dashboard title and interval.
/// The dashboard title is truncated so that the name fits within `max_len`,
/// but the interval suffix is never truncated. `max_len` must be at least
/// MAX_INTERVAL_SUFFIX_LEN for the name to always fit.
pub fn group_name(interval_seconds: i64, dashboard_title: &str, max_len: usize) -> String {
    let suffix = format!(" - {}", format_duration(interval_seconds.max(0) as u64));
    let title = truncate(dashboard_title, max_len.saturating_sub(suffix.len()));

    format!("{title}{suffix}")
}

/// Round a legacy evaluation frequency down to a multiple of the scheduler's base interval.
/// Frequencies at or below the base interval become the base interval.
pub fn adjust_interval(frequency_seconds: i64, base_interval_seconds: i64) -> i64 {
    if frequency_seconds <= base_interval_seconds {
        return base_interval_seconds;
    }
    frequency_seconds - frequency_seconds.checked_rem(base_interval_seconds).unwrap_or(0)
}

/// Format a duration of whole seconds in the style of Prometheus durations,
/// such as "10s", "1m30s", or "1d12h".
pub fn format_duration(seconds: u64) -> String {
    const UNITS: [(&str, u64); 6] = [
        ("y", 60 * 60 * 24 * 365),
        ("w", 60 * 60 * 24 * 7),
        ("d", 60 * 60 * 24),
        ("h", 60 * 60),
        ("m", 60),
        ("s", 1),
    ];
    if seconds == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    let mut remainder = seconds;

    for (unit, size) in UNITS {
        let count = remainder / size;
        if count != 0 {
            out.push_str(&format!("{count}{unit}"));
            remainder %= size;
        }
    }
    out
}

/// Truncate `s` to at most `max_len` bytes, without splitting a character.
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
