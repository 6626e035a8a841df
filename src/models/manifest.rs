//! Backup manifest keys as they appear in the bucket.
//!
//! Duplicity-style backup sets finish by writing an encrypted manifest named
//! `<identifier>.<YYYYMMDD>T<HHMMSS>Z.manifest.gpg`. The presence of such an
//! object is the only evidence that a backup set completed.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Matches a manifest basename and captures the completion date.
///
/// The character between `manifest` and `gpg` is deliberately any single
/// character, not only a dot.
static MANIFEST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*\.([0-9]{8})T[0-9]{6}Z\.manifest.gpg$").expect("manifest pattern is valid")
});

/// An object key split into the backup target it belongs to and its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupKey<'a> {
    /// Path portion before the last `/`; empty for keys at the bucket root.
    pub prefix: &'a str,

    /// Final path segment.
    pub basename: &'a str,
}

impl<'a> BackupKey<'a> {
    /// Split a key the way `dirname`/`basename` would.
    ///
    /// Redundant trailing slashes are dropped from the prefix unless the
    /// prefix consists only of slashes.
    pub fn split(key: &'a str) -> Self {
        match key.rfind('/') {
            Some(pos) => {
                let head = &key[..=pos];
                let trimmed = head.trim_end_matches('/');
                Self {
                    prefix: if trimmed.is_empty() { head } else { trimmed },
                    basename: &key[pos + 1..],
                }
            }
            None => Self {
                prefix: "",
                basename: key,
            },
        }
    }

    /// Interpret this key as a manifest, if it is one.
    pub fn manifest(&self) -> Option<Manifest<'a>> {
        let captures = MANIFEST_PATTERN.captures(self.basename)?;
        let date = parse_compact_date(captures.get(1)?.as_str())?;
        Some(Manifest {
            prefix: self.prefix,
            date,
        })
    }
}

/// A completed backup set: the target it belongs to and the day it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest<'a> {
    pub prefix: &'a str,
    pub date: NaiveDate,
}

impl<'a> Manifest<'a> {
    /// Parse a raw object key; `None` for anything that is not a manifest.
    pub fn from_key(key: &'a str) -> Option<Self> {
        BackupKey::split(key).manifest()
    }
}

/// Strict `YYYYMMDD` parsing. Rejects year zero and impossible calendar days.
fn parse_compact_date(digits: &str) -> Option<NaiveDate> {
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
