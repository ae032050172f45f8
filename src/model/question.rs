//! Durable question record, keyed by (quiz code, index) (`spec.md` §3
//! "Question"). `Points` and `CorrectAnswer` are tagged variants per
//! `spec.md` §9's explicit instruction, each with a custom `serde` decoder
//! so malformed wire values are rejected at creation rather than defaulting
//! silently at scoring time.

use std::collections::BTreeSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use crate::scoring::Points;

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Points::Standard => serializer.serialize_str("standard"),
            Points::Double => serializer.serialize_str("double"),
            Points::Zero => serializer.serialize_str("noPoints"),
            Points::Explicit(w) => serializer.serialize_u32(*w),
        }
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Int(u32),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) if s == "standard" => Ok(Points::Standard),
            Raw::Str(s) if s == "double" => Ok(Points::Double),
            Raw::Str(s) if s == "noPoints" => Ok(Points::Zero),
            Raw::Str(other) => Err(D::Error::custom(format!("unknown points value: {other}"))),
            Raw::Int(w) => Ok(Points::Explicit(w)),
        }
    }
}

/// `int | [int]`, per `spec.md` §9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectAnswer {
    Single(usize),
    Multi(BTreeSet<usize>),
}

impl CorrectAnswer {
    pub fn matches(&self, selected: &BTreeSet<usize>) -> bool {
        match self {
            CorrectAnswer::Single(idx) => selected.len() == 1 && selected.contains(idx),
            CorrectAnswer::Multi(set) => selected == set,
        }
    }

    /// Validates every index is within option bounds, per `spec.md` §9.
    pub fn validate(&self, option_count: usize) -> bool {
        match self {
            CorrectAnswer::Single(idx) => *idx < option_count,
            CorrectAnswer::Multi(set) => !set.is_empty() && set.iter().all(|i| *i < option_count),
        }
    }
}

impl Serialize for CorrectAnswer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorrectAnswer::Single(idx) => serializer.serialize_u64(*idx as u64),
            CorrectAnswer::Multi(set) => set.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CorrectAnswer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Single(usize),
            Multi(BTreeSet<usize>),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Single(idx) => CorrectAnswer::Single(idx),
            Raw::Multi(set) => CorrectAnswer::Multi(set),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub index: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: CorrectAnswer,
    pub time_limit_seconds: u32,
    pub points: Points,
    pub media_ref: Option<String>,
}

impl Question {
    /// View sent to non-admin callers and to `quiz_starting`/`next_question`
    /// broadcasts: strips `correct_answer` (`spec.md` §4.6, §6 "`correctAnswer`").
    pub fn sanitized(&self) -> SanitizedQuestion<'_> {
        SanitizedQuestion {
            index: self.index,
            prompt: &self.prompt,
            options: &self.options,
            time_limit_seconds: self.time_limit_seconds,
            points: self.points,
            media_ref: self.media_ref.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQuestion<'a> {
    pub index: u32,
    pub prompt: &'a str,
    pub options: &'a [String],
    pub time_limit_seconds: u32,
    pub points: Points,
    pub media_ref: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_correct_answer_matches_exact_selection() {
        let answer = CorrectAnswer::Single(2);
        assert!(answer.matches(&BTreeSet::from([2])));
        assert!(!answer.matches(&BTreeSet::from([1])));
        assert!(!answer.matches(&BTreeSet::from([1, 2])));
    }

    #[test]
    fn multi_correct_answer_requires_exact_set() {
        let answer = CorrectAnswer::Multi(BTreeSet::from([0, 2]));
        assert!(answer.matches(&BTreeSet::from([0, 2])));
        assert!(!answer.matches(&BTreeSet::from([0])));
    }

    #[test]
    fn validate_rejects_out_of_bounds_index() {
        assert!(!CorrectAnswer::Single(4).validate(3));
        assert!(CorrectAnswer::Single(2).validate(3));
    }

    #[test]
    fn points_rejects_unknown_string() {
        let raw = serde_json::json!("platinum");
        let result: Result<Points, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }
}
