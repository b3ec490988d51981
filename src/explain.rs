//! Reciter-error explanation.
//!
//! Aligns a predicted phoneme stream against the reference stream produced
//! by the phonetizer, and classifies every divergence as a tajweed error
//! (the mapping's rules cover the span), a normal speech error, or a
//! tashkeel slip (only the final haraka differs).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alphabet::phonetic_groups;
use crate::error::{PhoneticsError, Result};
use crate::levenshtein::{opcodes, OpTag};
use crate::mapping::MappingList;
use crate::rules::{CorrectnessType, TajweedRule};
use crate::sifa::chunk_phonemes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    Tajweed,
    Normal,
    Tashkeel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechErrorType {
    Insert,
    Delete,
    Replace,
}

/// One divergence between reference and prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReciterError {
    /// Codepoint span in the original Uthmani text.
    pub uthmani_pos: (u32, u32),
    /// Codepoint span in the reference phoneme stream.
    pub ph_pos: (u32, u32),
    pub error_type: ErrorType,
    pub speech_error_type: SpeechErrorType,
    pub expected_ph: String,
    pub predicted_ph: String,
    pub expected_len: Option<u32>,
    pub predicted_len: Option<u32>,
    pub tajweed_rules: Vec<TajweedRule>,
    pub predicted_tajweed_rules: Vec<TajweedRule>,
}

/// One step of the group-level alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonemeGroupAlignment {
    pub op_type: OpTag,
    pub ref_idx: usize,
    pub pred_idx: usize,
}

/// Align two group lists by their first codepoints, one entry per affected
/// index.
pub fn align_phoneme_groups(
    ref_groups: &[String],
    pred_groups: &[String],
) -> Vec<PhonemeGroupAlignment> {
    let ref_text: Vec<char> = ref_groups.iter().filter_map(|g| g.chars().next()).collect();
    let pred_text: Vec<char> = pred_groups.iter().filter_map(|g| g.chars().next()).collect();

    let mut out = Vec::new();
    for op in opcodes(&ref_text, &pred_text) {
        match op.tag {
            OpTag::Equal | OpTag::Replace => {
                for (r, p) in (op.src_start..op.src_end).zip(op.dst_start..op.dst_end) {
                    out.push(PhonemeGroupAlignment {
                        op_type: op.tag,
                        ref_idx: r,
                        pred_idx: p,
                    });
                }
            }
            OpTag::Insert => {
                for p in op.dst_start..op.dst_end {
                    out.push(PhonemeGroupAlignment {
                        op_type: OpTag::Insert,
                        ref_idx: op.src_start,
                        pred_idx: p,
                    });
                }
            }
            OpTag::Delete => {
                for r in op.src_start..op.src_end {
                    out.push(PhonemeGroupAlignment {
                        op_type: OpTag::Delete,
                        ref_idx: r,
                        pred_idx: op.dst_start,
                    });
                }
            }
        }
    }
    out
}

/// Invert the mapping into reference-phoneme-index → Uthmani-index. Two
/// source characters claiming one output position is an engine bug.
pub fn ref_phonetic_to_uthmani(mapping: &MappingList) -> Result<HashMap<u32, u32>> {
    let mut table = HashMap::new();
    for (uth_idx, span) in mapping.iter().enumerate() {
        for ph_idx in span.start..span.end {
            if table.insert(ph_idx, uth_idx as u32).is_some() {
                return Err(PhoneticsError::InvariantViolated {
                    index: uth_idx,
                    end: span.end,
                    next_start: span.start,
                });
            }
        }
    }
    Ok(table)
}

/// Tajweed rules per reference group: a group inherits every rule of every
/// Uthmani character it spans.
pub fn group_tajweed_rules(
    ref_groups: &[String],
    mapping: &MappingList,
    ph_to_uth: &HashMap<u32, u32>,
) -> Vec<Vec<TajweedRule>> {
    let mut out: Vec<Vec<TajweedRule>> = vec![Vec::new(); ref_groups.len()];
    let mut start = 0u32;
    for (g_idx, group) in ref_groups.iter().enumerate() {
        let end = start + group.chars().count() as u32;
        let mut used: Vec<u32> = Vec::new();
        for ph_idx in start..end {
            let Some(&uth_idx) = ph_to_uth.get(&ph_idx) else {
                continue;
            };
            if used.contains(&uth_idx) {
                continue;
            }
            used.push(uth_idx);
            out[g_idx].extend(mapping[uth_idx as usize].rules.iter().cloned());
        }
        start = end;
    }
    out
}

/// Classify every divergence between the reference and predicted streams.
pub fn explain_error(
    _uthmani: &str,
    ref_phonemes: &str,
    predicted_phonemes: &str,
    mapping: &MappingList,
) -> Result<Vec<ReciterError>> {
    let ref_groups = chunk_phonemes(ref_phonemes);
    let pred_groups = chunk_phonemes(predicted_phonemes);

    let ph_to_uth = ref_phonetic_to_uthmani(mapping)?;
    let rules_per_group = group_tajweed_rules(&ref_groups, mapping, &ph_to_uth);
    let alignments = align_phoneme_groups(&ref_groups, &pred_groups);

    let mut errors = Vec::new();
    let mut ref_start = 0u32;
    let mut ref_end = 0u32;

    let uth_at = |ph: u32| ph_to_uth.get(&ph).copied().unwrap_or(mapping.len() as u32);

    for align in alignments {
        let ref_ph = ref_groups
            .get(align.ref_idx)
            .map(String::as_str)
            .unwrap_or("");
        let pred_ph = pred_groups
            .get(align.pred_idx)
            .map(String::as_str)
            .unwrap_or("");

        let (uthmani_pos, ph_pos) = if align.op_type != OpTag::Insert {
            ref_end = ref_start + ref_ph.chars().count() as u32;
            (
                (uth_at(ref_start), uth_at(ref_end.saturating_sub(1)) + 1),
                (ref_start, ref_end),
            )
        } else {
            (
                (uth_at(ref_start), uth_at(ref_start)),
                (ref_start, ref_start),
            )
        };

        match align.op_type {
            OpTag::Insert => {
                errors.push(ReciterError {
                    uthmani_pos,
                    ph_pos,
                    error_type: ErrorType::Normal,
                    speech_error_type: SpeechErrorType::Insert,
                    expected_ph: String::new(),
                    predicted_ph: pred_ph.to_owned(),
                    expected_len: None,
                    predicted_len: None,
                    tajweed_rules: Vec::new(),
                    predicted_tajweed_rules: Vec::new(),
                });
            }

            OpTag::Replace => {
                let group_rules = &rules_per_group[align.ref_idx];
                if group_rules.is_empty() {
                    errors.push(ReciterError {
                        uthmani_pos,
                        ph_pos,
                        error_type: ErrorType::Normal,
                        speech_error_type: SpeechErrorType::Replace,
                        expected_ph: ref_ph.to_owned(),
                        predicted_ph: pred_ph.to_owned(),
                        expected_len: None,
                        predicted_len: None,
                        tajweed_rules: Vec::new(),
                        predicted_tajweed_rules: Vec::new(),
                    });
                }
                for rule in group_rules {
                    match rule.relevant_rule(pred_ph) {
                        Some(pred_rule) => {
                            let (expected_len, predicted_len) =
                                if pred_rule.correctness_type() == CorrectnessType::Count {
                                    (
                                        Some(rule.golden_len as u32),
                                        Some(pred_rule.count(pred_ph, pred_ph)),
                                    )
                                } else {
                                    (None, None)
                                };
                            errors.push(ReciterError {
                                uthmani_pos,
                                ph_pos,
                                error_type: ErrorType::Tajweed,
                                speech_error_type: SpeechErrorType::Replace,
                                expected_ph: ref_ph.to_owned(),
                                predicted_ph: pred_ph.to_owned(),
                                expected_len,
                                predicted_len,
                                tajweed_rules: vec![rule.clone()],
                                predicted_tajweed_rules: vec![pred_rule],
                            });
                        }
                        None => {
                            errors.push(ReciterError {
                                uthmani_pos,
                                ph_pos,
                                error_type: ErrorType::Tajweed,
                                speech_error_type: SpeechErrorType::Replace,
                                expected_ph: ref_ph.to_owned(),
                                predicted_ph: pred_ph.to_owned(),
                                expected_len: None,
                                predicted_len: None,
                                tajweed_rules: vec![rule.clone()],
                                predicted_tajweed_rules: Vec::new(),
                            });
                        }
                    }
                }
            }

            OpTag::Delete => {
                let has_rules = uthmani_pos.0 < mapping.len() as u32
                    && !mapping[uthmani_pos.0 as usize].rules.is_empty();
                errors.push(ReciterError {
                    uthmani_pos,
                    ph_pos,
                    error_type: if has_rules {
                        ErrorType::Tajweed
                    } else {
                        ErrorType::Normal
                    },
                    speech_error_type: SpeechErrorType::Delete,
                    expected_ph: ref_ph.to_owned(),
                    predicted_ph: String::new(),
                    expected_len: None,
                    predicted_len: None,
                    tajweed_rules: Vec::new(),
                    predicted_tajweed_rules: Vec::new(),
                });
            }

            OpTag::Equal => {
                if ref_ph != pred_ph {
                    let group_rules = &rules_per_group[align.ref_idx];
                    if !group_rules.is_empty() {
                        for rule in group_rules {
                            let (expected_len, predicted_len) =
                                if rule.correctness_type() == CorrectnessType::Count {
                                    (
                                        Some(rule.golden_len as u32),
                                        Some(rule.count(ref_ph, pred_ph)),
                                    )
                                } else {
                                    (None, None)
                                };
                            errors.push(ReciterError {
                                uthmani_pos,
                                ph_pos,
                                error_type: ErrorType::Tajweed,
                                speech_error_type: SpeechErrorType::Replace,
                                expected_ph: ref_ph.to_owned(),
                                predicted_ph: pred_ph.to_owned(),
                                expected_len,
                                predicted_len,
                                tajweed_rules: vec![rule.clone()],
                                predicted_tajweed_rules: Vec::new(),
                            });
                        }
                    } else if ref_ph
                        .chars()
                        .last()
                        .is_some_and(|c| phonetic_groups::HARAKAT.contains(c))
                        || pred_ph
                            .chars()
                            .last()
                            .is_some_and(|c| phonetic_groups::HARAKAT.contains(c))
                    {
                        // Same letter, different vowel tail.
                        errors.push(ReciterError {
                            uthmani_pos,
                            ph_pos,
                            error_type: ErrorType::Tashkeel,
                            speech_error_type: SpeechErrorType::Replace,
                            expected_ph: ref_ph.to_owned(),
                            predicted_ph: pred_ph.to_owned(),
                            expected_len: None,
                            predicted_len: None,
                            tajweed_rules: Vec::new(),
                            predicted_tajweed_rules: Vec::new(),
                        });
                    }
                }
            }
        }

        if align.op_type != OpTag::Insert {
            ref_start = ref_end;
        }
    }

    Ok(errors)
}
