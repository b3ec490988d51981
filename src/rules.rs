//! Tajweed rule descriptors attached to mapping spans.
//!
//! Rules are a small tagged union rather than a trait hierarchy: the engine
//! only ever needs the capability set {`is_ph_str_in`, `relevant_rule`,
//! `count`, `matches`} plus structural equality for tests.

use serde::{Deserialize, Serialize};

use crate::alphabet::phonetics;
use crate::error::{PhoneticsError, Result};

/// Display names in both scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LangName {
    pub ar: &'static str,
    pub en: &'static str,
}

/// How a predicted phoneme group is judged against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectnessType {
    /// The groups must simply agree.
    Match,
    /// The elongation count is measured against `golden_len`.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    NormalMadd,
    MonfaselMadd,
    MottaselMadd,
    LazemMadd,
    AaredMadd,
    LeenMadd,
    Qalqalah,
    Ghonna,
}

impl RuleKind {
    pub fn is_madd(self) -> bool {
        matches!(
            self,
            RuleKind::NormalMadd
                | RuleKind::MonfaselMadd
                | RuleKind::MottaselMadd
                | RuleKind::LazemMadd
                | RuleKind::AaredMadd
                | RuleKind::LeenMadd
        )
    }
}

/// Madd subtype: which long vowel carries the elongation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaddTag {
    Alif,
    Waw,
    Yaa,
}

impl MaddTag {
    pub fn as_str(self) -> &'static str {
        match self {
            MaddTag::Alif => "alif",
            MaddTag::Waw => "waw",
            MaddTag::Yaa => "yaa",
        }
    }

    /// Tag for a phonetic madd codepoint; the full waw/yaa letters also map
    /// because the leen madd is written with them.
    pub fn from_madd_char(c: char) -> Option<Self> {
        match c {
            c if c == phonetics::ALIF => Some(MaddTag::Alif),
            c if c == phonetics::WAW_MADD => Some(MaddTag::Waw),
            c if c == phonetics::YAA_MADD => Some(MaddTag::Yaa),
            'و' => Some(MaddTag::Waw),
            'ي' => Some(MaddTag::Yaa),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TajweedRule {
    pub kind: RuleKind,
    /// Canonical elongation count for count-type rules.
    pub golden_len: u16,
    pub tag: Option<MaddTag>,
}

impl TajweedRule {
    pub fn new(kind: RuleKind, golden_len: u16) -> Self {
        Self {
            kind,
            golden_len,
            tag: None,
        }
    }

    pub fn normal_madd() -> Self {
        Self::new(RuleKind::NormalMadd, 2)
    }

    pub fn qalqalah() -> Self {
        Self::new(RuleKind::Qalqalah, 0)
    }

    pub fn ghonna() -> Self {
        Self::new(RuleKind::Ghonna, 2)
    }

    pub fn with_tag(mut self, tag: MaddTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Parse a textual tag, rejecting tags outside the rule's allowed set.
    pub fn with_tag_str(self, tag: &str) -> Result<Self> {
        if !self.kind.is_madd() {
            return Err(PhoneticsError::TagInvalid {
                rule: self.name().en,
                tag: tag.to_owned(),
                allowed: "(none)",
            });
        }
        let parsed = match tag {
            "alif" => MaddTag::Alif,
            "waw" => MaddTag::Waw,
            "yaa" => MaddTag::Yaa,
            _ => {
                return Err(PhoneticsError::TagInvalid {
                    rule: self.name().en,
                    tag: tag.to_owned(),
                    allowed: "alif, waw, yaa",
                })
            }
        };
        Ok(self.with_tag(parsed))
    }

    pub fn name(&self) -> LangName {
        match self.kind {
            RuleKind::NormalMadd => LangName {
                ar: "المد الطبيعي",
                en: "Normal Madd",
            },
            RuleKind::MonfaselMadd => LangName {
                ar: "المد المنفصل",
                en: "Monfasel Madd",
            },
            RuleKind::MottaselMadd => LangName {
                ar: "المد المتصل",
                en: "Mottasel Madd",
            },
            RuleKind::LazemMadd => LangName {
                ar: "المد اللازم",
                en: "Lazem Madd",
            },
            RuleKind::AaredMadd => LangName {
                ar: "المد العارض للسكون",
                en: "Aared Madd",
            },
            RuleKind::LeenMadd => LangName {
                ar: "مد اللين",
                en: "Leen Madd",
            },
            RuleKind::Qalqalah => LangName {
                ar: "قلقلة",
                en: "Qalqalah",
            },
            RuleKind::Ghonna => LangName {
                ar: "غنة",
                en: "Ghonna",
            },
        }
    }

    pub fn correctness_type(&self) -> CorrectnessType {
        if self.kind.is_madd() {
            CorrectnessType::Count
        } else {
            CorrectnessType::Match
        }
    }

    /// Whether a phoneme group is the kind of group this rule judges.
    pub fn is_ph_str_in(&self, ph_str: &str) -> bool {
        if !self.kind.is_madd() {
            return true;
        }
        ph_str
            .chars()
            .next()
            .and_then(MaddTag::from_madd_char)
            .is_some()
    }

    /// A copy of this rule specialised to the predicted group, or `None` when
    /// the group has nothing for this rule to judge.
    pub fn relevant_rule(&self, ph_str: &str) -> Option<Self> {
        if !self.kind.is_madd() {
            return Some(self.clone());
        }
        let tag = MaddTag::from_madd_char(ph_str.chars().next()?)?;
        Some(self.clone().with_tag(tag))
    }

    /// Elongation beats observed in `pred_text`, counted as occurrences of
    /// the reference madd codepoint. A trailing haraka the model hallucinated
    /// after the madd is excluded from the count.
    pub fn count(&self, ref_text: &str, pred_text: &str) -> u32 {
        if !self.kind.is_madd() {
            return 0;
        }
        let target = match ref_text.chars().next() {
            Some(c) => c,
            None => return 0,
        };
        let pred: Vec<char> = pred_text.chars().collect();
        if pred.is_empty() {
            return 0;
        }
        let scan = if pred[pred.len() - 1] != pred[0] {
            &pred[..pred.len() - 1]
        } else {
            &pred[..]
        };
        scan.iter().filter(|&&c| c == target).count() as u32
    }

    pub fn matches(&self, ref_text: &str, pred_text: &str) -> bool {
        match self.correctness_type() {
            CorrectnessType::Match => ref_text == pred_text,
            CorrectnessType::Count => self.count(ref_text, pred_text) == self.golden_len as u32,
        }
    }
}
