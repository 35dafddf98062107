//! Canonical provider families.
//!
//! Sources name the same storefront in many ways ("Amazon Prime Video with
//! Ads", "Amazon Video", "Max", "HBO Max"). Every raw name is folded into a
//! family with an ordered rule table, and families carry a display priority.

use crate::constants::UNMAPPED_PRIORITY;

pub const AMAZON: &str = "Amazon";
pub const APPLE_TV: &str = "Apple TV";
pub const GOOGLE_PLAY: &str = "Google Play Movies";
pub const YOUTUBE: &str = "YouTube";
pub const HBO_MAX: &str = "HBO Max";
pub const SPECTRUM: &str = "Spectrum On Demand";
pub const CRITERION: &str = "Criterion Channel";
pub const FANDANGO: &str = "Fandango At Home";
pub const PHILO: &str = "Philo";

struct FamilyRule {
    family: &'static str,
    contains: &'static [&'static str],
    exact: &'static [&'static str],
}

// First match wins. Channel add-ons sold through the Amazon storefront
// ("Starz Amazon Channel", "MGM Plus Amazon Channel") fold into Amazon.
const RULES: &[FamilyRule] = &[
    FamilyRule {
        family: AMAZON,
        contains: &["amazon", "prime video"],
        exact: &[],
    },
    FamilyRule {
        family: APPLE_TV,
        contains: &["apple tv"],
        exact: &[],
    },
    FamilyRule {
        family: GOOGLE_PLAY,
        contains: &["google play"],
        exact: &[],
    },
    FamilyRule {
        family: YOUTUBE,
        contains: &["youtube"],
        exact: &[],
    },
    FamilyRule {
        family: HBO_MAX,
        contains: &["hbo max"],
        exact: &["max"],
    },
    FamilyRule {
        family: SPECTRUM,
        contains: &["spectrum on demand"],
        exact: &[],
    },
    FamilyRule {
        family: CRITERION,
        contains: &["criterion channel"],
        exact: &[],
    },
    FamilyRule {
        family: FANDANGO,
        contains: &["fandango"],
        exact: &[],
    },
    FamilyRule {
        family: PHILO,
        contains: &["philo"],
        exact: &[],
    },
];

const PRIORITIES: &[(&str, u32)] = &[
    ("Netflix", 1),
    (HBO_MAX, 2),
    ("Hulu", 3),
    ("Disney Plus", 4),
    (AMAZON, 5),
    (APPLE_TV, 6),
    ("Peacock", 7),
    ("Paramount Plus", 8),
    (CRITERION, 9),
    ("Kanopy", 10),
    (GOOGLE_PLAY, 11),
    (YOUTUBE, 12),
    (FANDANGO, 13),
    (SPECTRUM, 14),
    (PHILO, 15),
];

/// Map a raw provider name to its family.
///
/// Unknown names are their own family (trimmed). Blank input yields an empty
/// string, which callers must discard.
pub fn family_of(raw_name: &str) -> String {
    let trimmed = raw_name.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_lowercase();
    RULES
        .iter()
        .find(|rule| {
            rule.exact.iter().any(|e| lower == *e)
                || rule.contains.iter().any(|c| lower.contains(c))
        })
        .map(|rule| rule.family.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Sort priority of a family (lower shows first)
pub fn priority_of(family: &str) -> u32 {
    PRIORITIES
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, p)| *p)
        .unwrap_or(UNMAPPED_PRIORITY)
}
