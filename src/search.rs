//! Fuzzy search over the phoneme index.
//!
//! The query is normalised exactly like the corpus (first codepoint of every
//! phoneme group), matched against `ref_norm` within a bounded edit
//! distance, and each hit resolves back to sura/aya/word/char spans through
//! the row table.

use std::path::Path;

use crate::alphabet::uthmani;
use crate::error::{PhoneticsError, Result};
use crate::index::PhonemeIndex;
use crate::levenshtein::find_near_matches;
use crate::quran::QuranCorpus;
use crate::sifa::{chunk_phonemes, normalize_phonetic_groups};

/// One end of a match, inclusive for the start span and exclusive for the
/// end span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonemeSearchSpan {
    /// 1-based.
    pub sura_idx: u16,
    /// 1-based.
    pub aya_idx: u16,
    /// 0-based within the aya.
    pub uthmani_word_idx: u16,
    /// 0-based within the cleaned Uthmani text of the aya.
    pub uthmani_char_idx: u16,
    /// 0-based within the aya's space-free phoneme stream.
    pub phonemes_idx: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonemeMatch {
    pub start: PhonemeSearchSpan,
    pub end: PhonemeSearchSpan,
    /// Edit distance of this hit.
    pub dist: u32,
}

pub struct PhoneticSearch {
    index: PhonemeIndex,
    ref_chars: Vec<char>,
}

impl PhoneticSearch {
    pub fn new(index: PhonemeIndex) -> Self {
        let ref_chars = index.ref_norm.chars().collect();
        Self { index, ref_chars }
    }

    /// Load a persisted index from `data_dir`; the load performs the
    /// row-count/codepoint-count consistency check.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self::new(PhonemeIndex::load(data_dir)?))
    }

    pub fn index(&self) -> &PhonemeIndex {
        &self.index
    }

    fn span_at(&self, ref_idx: usize, end: bool) -> PhonemeSearchSpan {
        let row = self.index.rows[ref_idx];
        PhonemeSearchSpan {
            sura_idx: row[0],
            aya_idx: row[1],
            uthmani_word_idx: row[2],
            uthmani_char_idx: if end { row[4] } else { row[3] },
            phonemes_idx: if end { row[6] } else { row[5] },
        }
    }

    /// All fuzzy occurrences of `query` in the corpus.
    ///
    /// `error_ratio` scales the edit budget: `max_edits =
    /// floor(len(normalized query) * error_ratio)`.
    pub fn search(&self, query: &str, error_ratio: f32) -> Result<Vec<PhonemeMatch>> {
        if query.is_empty() {
            return Err(PhoneticsError::QueryEmpty);
        }
        if !(0.0..=1.0).contains(&error_ratio) {
            return Err(PhoneticsError::ErrorRatioOutOfRange(error_ratio));
        }

        let groups = chunk_phonemes(query);
        let norm_query: Vec<char> = normalize_phonetic_groups(&groups).chars().collect();
        if norm_query.is_empty() {
            return Err(PhoneticsError::QueryEmpty);
        }
        let max_edits = (norm_query.len() as f32 * error_ratio).floor() as u32;

        let found = find_near_matches(&norm_query, &self.ref_chars, max_edits);
        if found.is_empty() {
            return Err(PhoneticsError::NoResults);
        }

        Ok(found
            .into_iter()
            .map(|m| PhonemeMatch {
                start: self.span_at(m.start, false),
                end: self.span_at(m.end - 1, true),
                dist: m.dist,
            })
            .collect())
    }

    /// The Uthmani words behind a match, joined by the Uthmani space. Walks
    /// every aya the match crosses.
    pub fn uthmani_text(&self, corpus: &QuranCorpus, m: &PhonemeMatch) -> Result<String> {
        let mut words: Vec<String> = Vec::new();
        let mut first_word = m.start.uthmani_word_idx as usize;

        for aya in corpus.ayat_after(m.start.sura_idx, m.start.aya_idx) {
            let aya_words = aya.uthmani_words();
            if aya.sura_idx == m.end.sura_idx && aya.aya_idx == m.end.aya_idx {
                let last = (m.end.uthmani_word_idx as usize).min(aya_words.len() - 1);
                words.extend(aya_words[first_word..=last].iter().cloned());
                return Ok(words.join(&uthmani::SPACE.to_string()));
            }
            words.extend(aya_words[first_word..].iter().cloned());
            first_word = 0;
        }
        Err(PhoneticsError::CorpusError(format!(
            "match end {}:{} not found in the corpus",
            m.end.sura_idx, m.end.aya_idx
        )))
    }
}
