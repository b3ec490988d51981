//! The phonetizer: Uthmani text in, phonetic script plus mapping out.

use std::collections::HashSet;

use log::debug;
use regex::Regex;

use crate::error::Result;
use crate::mapping::{sub_with_mapping, MappingList};
use crate::moshaf::MoshafConfig;
use crate::operations::{Mode, OperationSet};
use crate::sifa::{process_sifat, SifaOutput};

/// Everything one phonetizer invocation produces.
#[derive(Debug)]
pub struct PhoneticOutput {
    pub phonemes: String,
    pub sifat: Vec<SifaOutput>,
    /// One span per codepoint of the original Uthmani input.
    pub mapping: MappingList,
}

/// A compiled pipeline for one Moshaf configuration. Compile once, call
/// `phonetize` per aya.
pub struct Phonetizer {
    moshaf: MoshafConfig,
    operations: OperationSet,
    collapse_ws: Regex,
    trim_ws: Regex,
    mark_order: Regex,
    spaces: Regex,
}

impl Phonetizer {
    pub fn new(moshaf: MoshafConfig) -> Result<Self> {
        let operations = OperationSet::new(&moshaf)?;
        Ok(Self {
            moshaf,
            operations,
            collapse_ws: Regex::new(r"\s+").expect("static pattern"),
            trim_ws: Regex::new(r"(\s$|^\s)").expect("static pattern"),
            // The corpus writes shadda before its haraka; some sources carry
            // the reordered form.
            mark_order: Regex::new("([\u{064B}-\u{0650}])\u{0651}").expect("static pattern"),
            spaces: Regex::new(" ").expect("static pattern"),
        })
    }

    pub fn moshaf(&self) -> &MoshafConfig {
        &self.moshaf
    }

    pub fn operations(&self) -> &OperationSet {
        &self.operations
    }

    /// Convert one Uthmani text to the phonetic script.
    ///
    /// The returned mapping has exactly one span per codepoint of the input;
    /// `remove_spaces` strips the word separators from the phoneme stream
    /// (their spans stay behind as deleted markers on the word boundaries).
    pub fn phonetize(&self, uthmani: &str, remove_spaces: bool) -> Result<PhoneticOutput> {
        if uthmani.is_empty() {
            return Ok(PhoneticOutput {
                phonemes: String::new(),
                sifat: Vec::new(),
                mapping: Vec::new(),
            });
        }

        let (text, mapping) = sub_with_mapping(&self.collapse_ws, " ", uthmani, None, None)?;
        let (text, mapping) = sub_with_mapping(&self.trim_ws, "", &text, Some(mapping), None)?;
        let (mut text, mapping) =
            sub_with_mapping(&self.mark_order, "\u{0651}${1}", &text, Some(mapping), None)?;
        let mut mapping = Some(mapping);

        let discard = HashSet::new();
        for op in self.operations.ops() {
            let (next, m) =
                self.operations
                    .apply(op.arabic_name, &text, mapping.take(), Mode::Inference, &discard)?;
            debug!("{}: `{}`", op.arabic_name, next);
            text = next;
            mapping = Some(m);
        }

        let sifat = process_sifat(uthmani, &text, &self.moshaf);

        let mut mapping = mapping.unwrap_or_default();
        if remove_spaces {
            let (stripped, m) = sub_with_mapping(&self.spaces, "", &text, Some(mapping), None)?;
            text = stripped;
            mapping = m;
        }

        Ok(PhoneticOutput {
            phonemes: text,
            sifat,
            mapping,
        })
    }
}

/// One-shot convenience wrapper; compiles the pipeline for a single call.
pub fn phonetize(
    uthmani: &str,
    moshaf: &MoshafConfig,
    remove_spaces: bool,
) -> Result<PhoneticOutput> {
    Phonetizer::new(moshaf.clone())?.phonetize(uthmani, remove_spaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::uthmani;
    use crate::rules::{MaddTag, RuleKind};
    use pretty_assertions::assert_eq;

    fn hafs(aared: u8) -> MoshafConfig {
        MoshafConfig::hafs(4, 4, 4, aared)
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = phonetize("", &hafs(4), false).unwrap();
        assert_eq!(out.phonemes, "");
        assert!(out.mapping.is_empty());
        assert!(out.sifat.is_empty());
    }

    #[test]
    fn basmala_with_aared_four() {
        let input = "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ";
        let out = phonetize(input, &hafs(4), false).unwrap();
        assert_eq!(out.phonemes, "بِسمِ للَااهِ ررَحمَاانِ ررَحِۦۦۦۦم");
        assert_eq!(out.mapping.len(), input.chars().count());
    }

    #[test]
    fn basmala_with_aared_six() {
        let input = "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ";
        let out = phonetize(input, &hafs(6), false).unwrap();
        assert_eq!(out.phonemes, "بِسمِ للَااهِ ررَحمَاانِ ررَحِۦۦۦۦۦۦم");
    }

    #[test]
    fn basmala_mapping_carries_the_ism_allah_madd() {
        let input = "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ";
        let out = phonetize(input, &hafs(4), false).unwrap();
        // The alif the pipeline adds inside the name of Allah is a normal
        // madd; its rule lands on the source codepoints around the fatha.
        let tagged: Vec<usize> = out
            .mapping
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                m.rules
                    .iter()
                    .any(|r| r.kind == RuleKind::NormalMadd && r.tag == Some(MaddTag::Alif))
            })
            .map(|(i, _)| i)
            .collect();
        assert!(
            tagged.iter().any(|&i| (9..=12).contains(&i)),
            "NormalMadd(alif) expected near the lam of the name of Allah, got {tagged:?}"
        );
    }

    #[test]
    fn spaces_map_to_deleted_spans() {
        // With the separators stripped, every Uthmani space pins a word
        // boundary as a deleted span.
        let input = "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ";
        let out = phonetize(input, &hafs(4), true).unwrap();
        for (i, c) in input.chars().enumerate() {
            if c == uthmani::SPACE {
                assert!(out.mapping[i].deleted, "space at {i} must be deleted");
            }
        }
    }

    #[test]
    fn shadda_assimilation_across_words() {
        let out = phonetize("لَكُم مَّا", &hafs(4), false).unwrap();
        assert_eq!(out.phonemes, "لَكُممممَاا");
        let space_idx = 5;
        assert!(out.mapping[space_idx].deleted);
        // The final alif pair is a normal madd.
        let last = out.mapping.last().unwrap();
        assert!(last
            .rules
            .iter()
            .any(|r| r.kind == RuleKind::NormalMadd && r.tag == Some(MaddTag::Alif)));
    }

    #[test]
    fn disjoined_letters_expand_with_a_five_codepoint_mapping() {
        let input = "الٓمٓ";
        let out = phonetize(input, &hafs(4), false).unwrap();
        assert_eq!(out.phonemes, "ءَلِف لَااااااممممِۦۦۦۦۦۦم");
        assert_eq!(out.mapping.len(), 5);
        // Spans widen to cover the expansions and stay contiguous.
        let covered: u32 = out
            .mapping
            .iter()
            .filter(|m| !m.deleted)
            .map(|m| m.end - m.start)
            .sum();
        assert_eq!(covered as usize, out.phonemes.chars().count());
    }

    #[test]
    fn reordered_marks_normalize_before_the_pipeline() {
        // A shadda written after its haraka phonetizes identically.
        let reordered = "لَكُم م\u{064E}\u{0651}ا";
        let out = phonetize(reordered, &hafs(4), false).unwrap();
        assert_eq!(out.phonemes, "لَكُممممَاا");
        assert_eq!(out.mapping.len(), 10);
    }

    #[test]
    fn remove_spaces_strips_the_separators() {
        let input = "لَكُم مَّا";
        let out = phonetize(input, &hafs(4), true).unwrap();
        assert!(!out.phonemes.contains(' '));
        assert_eq!(out.mapping.len(), input.chars().count());
    }

    #[test]
    fn aared_length_only_touches_the_final_madd() {
        let input = "إِيَّاكَ نَعْبُدُ وَإِيَّاكَ نَسْتَعِينُ";
        let out = phonetize(input, &hafs(4), false).unwrap();
        assert_eq!(out.phonemes, "ءِييَااكَ نَعبُدُ وَءِييَااكَ نَستَعِۦۦۦۦن");
    }

    #[test]
    fn phoneme_output_stays_in_the_phonetic_alphabet() {
        use crate::alphabet::phonetics::ALPHABET;
        let inputs = [
            "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ",
            "لَكُم مَّا",
            "الٓمٓ",
            "مَـٰلِكِ يَوْمِ ٱلدِّينِ",
        ];
        for input in inputs {
            let out = phonetize(input, &hafs(4), false).unwrap();
            for c in out.phonemes.chars() {
                assert!(
                    c == ' ' || ALPHABET.contains(c),
                    "`{c}` (U+{:04X}) escaped the phonetic alphabet in `{}`",
                    c as u32,
                    out.phonemes
                );
            }
        }
    }

    #[test]
    fn identity_operation_chain_preserves_contiguity() {
        // Every op ran on a text none of them rewrite: mapping must still be
        // the identity.
        let input = "من";
        let out = phonetize(input, &hafs(4), false).unwrap();
        assert_eq!(out.mapping.len(), 2);
        assert_eq!(out.mapping[0].start, 0);
    }
}
