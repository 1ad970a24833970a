//! Semantic versioning of workflow template history.
//!
//! History rows carry `major.minor.patch` strings. Rows written before
//! semantic versions existed hold a bare integer, read as `1.0.<n>`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Version given to the first history row of a template.
pub const INITIAL_VERSION: &str = "1.0.0";

static SEMVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

/// Which component of the version a commit increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    Major,
    Minor,
    #[default]
    Patch,
}

impl BumpType {
    /// Imports never bump the patch component.
    pub fn for_import(requested: Option<BumpType>) -> BumpType {
        match requested {
            Some(BumpType::Major) => BumpType::Major,
            _ => BumpType::Minor,
        }
    }
}

/// Parse a stored version, coercing legacy integers to `1.0.<n>`.
pub fn parse_stored_version(stored: &str) -> Result<semver::Version, CoreError> {
    let trimmed = stored.trim();
    let candidate = if SEMVER_RE.is_match(trimmed) {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("1.0.{trimmed}"))
    };
    semver::Version::parse(&candidate).map_err(|e| {
        CoreError::Validation(format!("Stored version '{stored}' is not a valid version: {e}"))
    })
}

/// Compute the version that follows `last` for the given bump.
///
/// With no previous version the result is always [`INITIAL_VERSION`].
pub fn next_version(last: Option<&str>, bump: BumpType) -> Result<String, CoreError> {
    let Some(last) = last else {
        return Ok(INITIAL_VERSION.to_string());
    };
    let current = parse_stored_version(last)?;
    let next = match bump {
        BumpType::Major => semver::Version::new(current.major + 1, 0, 0),
        BumpType::Minor => semver::Version::new(current.major, current.minor + 1, 0),
        BumpType::Patch => semver::Version::new(current.major, current.minor, current.patch + 1),
    };
    Ok(next.to_string())
}

// ---------------------------------------------------------------------------
// Auto-save debounce
// ---------------------------------------------------------------------------

/// Who saved, from where, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStamp {
    pub user_id: String,
    pub x_forwarded_for: Option<String>,
    pub at: Timestamp,
}

/// Whether an auto-save should write a new history row.
///
/// A row is written when there is no previous row, when the user or the
/// forwarded-for address changed, or when more than `delay` has passed since
/// the previous row.
pub fn should_auto_save(last: Option<&SaveStamp>, current: &SaveStamp, delay: chrono::Duration) -> bool {
    let Some(last) = last else {
        return true;
    };
    last.user_id != current.user_id
        || last.x_forwarded_for != current.x_forwarded_for
        || current.at - last.at > delay
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn first_version_is_initial_regardless_of_bump() {
        assert_eq!(next_version(None, BumpType::Major).unwrap(), "1.0.0");
        assert_eq!(next_version(None, BumpType::Patch).unwrap(), "1.0.0");
    }

    #[test]
    fn minor_bumps_are_monotonic() {
        let mut version: Option<String> = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            let next = next_version(version.as_deref(), BumpType::Minor).unwrap();
            seen.push(next.clone());
            version = Some(next);
        }
        assert_eq!(seen, vec!["1.0.0", "1.1.0", "1.2.0", "1.3.0"]);
    }

    #[test]
    fn major_bump_resets_minor_and_patch() {
        assert_eq!(next_version(Some("2.4.7"), BumpType::Major).unwrap(), "3.0.0");
    }

    #[test]
    fn minor_bump_resets_patch() {
        assert_eq!(next_version(Some("2.4.7"), BumpType::Minor).unwrap(), "2.5.0");
    }

    #[test]
    fn patch_bump_increments_patch() {
        assert_eq!(next_version(Some("2.4.7"), BumpType::Patch).unwrap(), "2.4.8");
    }

    #[test]
    fn legacy_integer_is_read_as_patch_of_1_0() {
        assert_eq!(parse_stored_version("7").unwrap(), semver::Version::new(1, 0, 7));
        assert_eq!(next_version(Some("7"), BumpType::Minor).unwrap(), "1.1.0");
        assert_eq!(next_version(Some("7"), BumpType::Patch).unwrap(), "1.0.8");
        assert_eq!(next_version(Some("7"), BumpType::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn garbage_version_is_rejected() {
        assert_matches!(parse_stored_version("abc"), Err(CoreError::Validation(_)));
        assert_matches!(parse_stored_version("1.2"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn import_only_bumps_major_or_minor() {
        assert_eq!(BumpType::for_import(None), BumpType::Minor);
        assert_eq!(BumpType::for_import(Some(BumpType::Patch)), BumpType::Minor);
        assert_eq!(BumpType::for_import(Some(BumpType::Major)), BumpType::Major);
    }

    #[test]
    fn bump_type_deserializes_lowercase() {
        let bump: BumpType = serde_json::from_str("\"major\"").unwrap();
        assert_eq!(bump, BumpType::Major);
    }

    // -- should_auto_save ------------------------------------------------------

    fn stamp(user: &str, xff: Option<&str>, secs: i64) -> SaveStamp {
        SaveStamp {
            user_id: user.to_string(),
            x_forwarded_for: xff.map(str::to_string),
            at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(secs),
        }
    }

    #[test]
    fn first_auto_save_always_writes() {
        assert!(should_auto_save(None, &stamp("u1", None, 0), Duration::seconds(60)));
    }

    #[test]
    fn same_user_same_address_within_delay_is_debounced() {
        let last = stamp("u1", Some("10.0.0.1"), 0);
        let current = stamp("u1", Some("10.0.0.1"), 30);
        assert!(!should_auto_save(Some(&last), &current, Duration::seconds(60)));
    }

    #[test]
    fn different_user_forces_a_row() {
        let last = stamp("u1", Some("10.0.0.1"), 0);
        let current = stamp("u2", Some("10.0.0.1"), 1);
        assert!(should_auto_save(Some(&last), &current, Duration::seconds(60)));
    }

    #[test]
    fn different_forwarded_for_forces_a_row() {
        let last = stamp("u1", Some("10.0.0.1"), 0);
        let current = stamp("u1", Some("10.0.0.2"), 1);
        assert!(should_auto_save(Some(&last), &current, Duration::seconds(60)));
    }

    #[test]
    fn exceeding_the_delay_forces_a_row() {
        let last = stamp("u1", None, 0);
        assert!(!should_auto_save(Some(&last), &stamp("u1", None, 60), Duration::seconds(60)));
        assert!(should_auto_save(Some(&last), &stamp("u1", None, 61), Duration::seconds(60)));
    }
}
