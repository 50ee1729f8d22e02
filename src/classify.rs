//! Identifier pattern classification.
//!
//! Numeric probing needs arithmetic neighbours; walking the tree needs
//! nothing from the identifiers but depends on the catalog being complete.
//! Classifying the identifier set decides which of the two can work.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::formats::{IdentifierPattern, PatternType, Strategy};

/// Below this share of the dominant class the set is treated as mixed.
pub const MIN_CONFIDENCE: f64 = 0.5;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

static PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<affix>[A-Za-z]+(?:\d*[_-])?)(?P<num>\d+)$").expect("valid regex")
});

static SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>\d+)(?P<affix>[_-]?[A-Za-z]+)$").expect("valid regex")
});

static UUID_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("valid regex")
});

static HASH_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{32,}$").expect("valid regex"));

static OPAQUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{8,}$").expect("valid regex"));

static SHORT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid regex"));

/// Per-identifier class, in test priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum IdClass {
    Numeric,
    Affixed,
    Opaque,
    ShortToken,
    Unknown,
}

impl IdClass {
    fn of(identifier: &str) -> Self {
        if NUMERIC.is_match(identifier) {
            Self::Numeric
        } else if PREFIXED.is_match(identifier) || SUFFIXED.is_match(identifier) {
            Self::Affixed
        } else if UUID_LIKE.is_match(identifier)
            || HASH_LIKE.is_match(identifier)
            || OPAQUE.is_match(identifier)
        {
            Self::Opaque
        } else if SHORT_TOKEN.is_match(identifier) {
            Self::ShortToken
        } else {
            Self::Unknown
        }
    }

    fn pattern_type(self) -> PatternType {
        match self {
            Self::Numeric => PatternType::SequentialNumeric,
            Self::Affixed => PatternType::SequentialAffixed,
            Self::Opaque => PatternType::RandomString,
            Self::ShortToken => PatternType::Mixed,
            Self::Unknown => PatternType::Unknown,
        }
    }
}

fn strategy_for(pattern_type: PatternType) -> Strategy {
    match pattern_type {
        PatternType::SequentialNumeric | PatternType::SequentialAffixed => Strategy::NumericProbe,
        PatternType::RandomString => Strategy::StructuralWalk,
        PatternType::Mixed => Strategy::Hybrid,
        PatternType::Unknown => Strategy::Default,
    }
}

pub fn classify<'a, I>(identifiers: I) -> IdentifierPattern
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<IdClass, usize> = HashMap::new();
    let mut total = 0_usize;
    for identifier in identifiers {
        if identifier.is_empty() {
            continue;
        }
        *counts.entry(IdClass::of(identifier)).or_default() += 1;
        total += 1;
    }

    // Plurality wins; ties go to the class tested first.
    let Some((class, count)) = counts
        .into_iter()
        .max_by(|(a_class, a), (b_class, b)| a.cmp(b).then(b_class.cmp(a_class)))
    else {
        return IdentifierPattern {
            pattern_type: PatternType::Unknown,
            confidence: 0.0,
            recommended_strategy: Strategy::Default,
        };
    };

    let confidence = count as f64 / total as f64;
    if confidence < MIN_CONFIDENCE {
        return IdentifierPattern {
            pattern_type: PatternType::Mixed,
            confidence,
            recommended_strategy: Strategy::Hybrid,
        };
    }

    let pattern_type = class.pattern_type();
    IdentifierPattern {
        pattern_type,
        confidence,
        recommended_strategy: strategy_for(pattern_type),
    }
}

/// An identifier split around its numeric part, e.g. `DZ0336_12` → (`DZ0336_`, 12, ``).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedId {
    pub prefix: String,
    pub number: u64,
    pub suffix: String,
}

impl NumberedId {
    pub fn parse(identifier: &str) -> Option<Self> {
        if NUMERIC.is_match(identifier) {
            return Some(Self {
                prefix: String::new(),
                number: identifier.parse().ok()?,
                suffix: String::new(),
            });
        }
        if let Some(caps) = PREFIXED.captures(identifier) {
            return Some(Self {
                prefix: caps["affix"].to_owned(),
                number: caps["num"].parse().ok()?,
                suffix: String::new(),
            });
        }
        let caps = SUFFIXED.captures(identifier)?;
        Some(Self {
            prefix: String::new(),
            number: caps["num"].parse().ok()?,
            suffix: caps["affix"].to_owned(),
        })
    }

    /// Same affixes, different number.
    pub fn with_number(&self, number: u64) -> String {
        format!("{}{number}{}", self.prefix, self.suffix)
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.suffix == other.suffix
    }
}
