//! The phoneme index: one row per phoneme group across the whole corpus,
//! persisted as a NumPy `.npy` table plus the normalized phoneme corpus.
//!
//! Row layout (`u16` columns):
//! `[sura, aya, word_in_aya, uth_char_start, uth_char_end, ph_start, ph_end]`
//! where sura/aya are 1-based, the word and char indices are 0-based within
//! the cleaned Uthmani text of the aya, and the `ph_*` offsets index that
//! aya's space-free phoneme stream.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info};

use crate::alphabet::uthmani;
use crate::error::{PhoneticsError, Result};
use crate::mapping::MappingList;
use crate::phonetizer::Phonetizer;
use crate::quran::{clean_uthmani_spaces, QuranCorpus};
use crate::sifa::{chunk_phonemes, normalize_phonetic_groups};

pub const INDEX_FILE: &str = "ph_index.npy";
pub const REF_NORM_FILE: &str = "ref_norm_ph.txt";

pub const ROW_WIDTH: usize = 7;

pub type PhonemeIndexRow = [u16; ROW_WIDTH];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeIndex {
    pub rows: Vec<PhonemeIndexRow>,
    /// `ref_norm[i]` is the first codepoint of the group behind `rows[i]`.
    pub ref_norm: String,
}

/// Word-boundary positions of an aya in its phoneme stream: the deleted
/// span of every Uthmani space pins the boundary.
pub fn word_boundaries_in_phonemes(uth_text: &str, mapping: &MappingList) -> Result<Vec<u32>> {
    let mut boundaries = Vec::new();
    for (i, c) in uth_text.chars().enumerate() {
        if c != uthmani::SPACE {
            continue;
        }
        let span = &mapping[i];
        if !span.deleted {
            return Err(PhoneticsError::InvariantViolated {
                index: i,
                end: span.end,
                next_start: span.start,
            });
        }
        boundaries.push(span.start);
    }
    Ok(boundaries)
}

/// Invert a mapping into phoneme-position → Uthmani-position, with one extra
/// entry for the exclusive upper bound.
pub fn phonetic_to_uthmani(mapping: &MappingList) -> Vec<u16> {
    let upper = mapping.last().map(|m| m.end).unwrap_or(0) as usize;
    let mut table = vec![0u16; upper + 1];
    for (uth_idx, span) in mapping.iter().enumerate() {
        for ph_idx in span.start..span.end {
            table[ph_idx as usize] = uth_idx as u16;
        }
    }
    table[upper] = mapping.len() as u16;
    table
}

/// Build the index over the whole corpus.
pub fn build_index(corpus: &QuranCorpus, phonetizer: &Phonetizer) -> Result<PhonemeIndex> {
    let mut rows: Vec<PhonemeIndexRow> = Vec::new();
    let mut ref_norm = String::new();

    for aya in corpus.ayat() {
        let uth_text = clean_uthmani_spaces(&aya.uthmani);
        let out = phonetizer.phonetize(&uth_text, true)?;
        let groups = chunk_phonemes(&out.phonemes);
        ref_norm.push_str(&normalize_phonetic_groups(&groups));

        let boundaries = word_boundaries_in_phonemes(&uth_text, &out.mapping)?;
        let ph_to_uth = phonetic_to_uthmani(&out.mapping);

        let mut ph_start = 0usize;
        let mut word_idx = 0u16;
        let mut bound_idx = 0usize;
        for (g_idx, group) in groups.iter().enumerate() {
            let ph_end = ph_start + group.chars().count();
            let next_ph_end = groups
                .get(g_idx + 1)
                .map(|g| ph_end + g.chars().count())
                .unwrap_or(ph_end);

            rows.push([
                aya.sura_idx,
                aya.aya_idx,
                word_idx,
                ph_to_uth[ph_start],
                ph_to_uth[ph_end],
                ph_start as u16,
                ph_end as u16,
            ]);

            if bound_idx < boundaries.len() {
                let bound = boundaries[bound_idx] as usize;
                // A group shared between two words counts with the second.
                if ph_end >= bound || (ph_end < bound && next_ph_end > bound) {
                    word_idx += 1;
                    bound_idx += 1;
                }
            }
            ph_start = ph_end;
        }
        debug!(
            "indexed {}:{} ({} groups)",
            aya.sura_idx,
            aya.aya_idx,
            groups.len()
        );
    }

    info!("index built: {} phoneme groups", rows.len());
    Ok(PhonemeIndex { rows, ref_norm })
}

impl PhonemeIndex {
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        write_npy_u16(&dir.join(INDEX_FILE), &self.rows)?;
        fs::write(dir.join(REF_NORM_FILE), self.ref_norm.as_bytes())?;
        info!("index saved to {}", dir.display());
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let index_path = dir.join(INDEX_FILE);
        let ref_path = dir.join(REF_NORM_FILE);
        if !index_path.exists() {
            return Err(PhoneticsError::IndexMissing(index_path));
        }
        if !ref_path.exists() {
            return Err(PhoneticsError::IndexMissing(ref_path));
        }
        let rows = read_npy_u16(&index_path)?;
        let ref_norm = fs::read_to_string(&ref_path)?;
        let ref_norm = ref_norm.trim_end_matches('\n').to_owned();

        let codepoints = ref_norm.chars().count();
        if codepoints != rows.len() {
            return Err(PhoneticsError::IndexCorrupt {
                rows: rows.len(),
                codepoints,
            });
        }
        Ok(Self { rows, ref_norm })
    }
}

// `.npy` version 1.0, dtype `<u2`, row-major `(N, 7)`.

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

fn write_npy_u16(path: &Path, rows: &[PhonemeIndexRow]) -> Result<()> {
    let header_dict = format!(
        "{{'descr': '<u2', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows.len(),
        ROW_WIDTH
    );
    // Total header (magic + version + length field + dict + padding + \n)
    // must be a multiple of 64.
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header_dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = (header_dict.len() + padding + 1) as u16;

    let mut file = fs::File::create(path)?;
    file.write_all(NPY_MAGIC)?;
    file.write_all(&[1, 0])?;
    file.write_all(&header_len.to_le_bytes())?;
    file.write_all(header_dict.as_bytes())?;
    file.write_all(" ".repeat(padding).as_bytes())?;
    file.write_all(b"\n")?;

    let mut data = Vec::with_capacity(rows.len() * ROW_WIDTH * 2);
    for row in rows {
        for value in row {
            data.extend_from_slice(&value.to_le_bytes());
        }
    }
    file.write_all(&data)?;
    Ok(())
}

fn bad_npy(path: &Path, why: &str) -> PhoneticsError {
    PhoneticsError::CorpusError(format!("{}: {}", path.display(), why))
}

fn read_npy_u16(path: &Path) -> Result<Vec<PhonemeIndexRow>> {
    let mut file = fs::File::open(path)?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;

    if raw.len() < 10 || &raw[..6] != NPY_MAGIC {
        return Err(bad_npy(path, "not an npy file"));
    }
    let header_len = u16::from_le_bytes([raw[8], raw[9]]) as usize;
    let body_start = 10 + header_len;
    if raw.len() < body_start {
        return Err(bad_npy(path, "truncated header"));
    }
    let header = String::from_utf8_lossy(&raw[10..body_start]);
    if !header.contains("'<u2'") {
        return Err(bad_npy(path, "dtype is not <u2"));
    }
    if header.contains("'fortran_order': True") {
        return Err(bad_npy(path, "fortran order is not supported"));
    }

    let body = &raw[body_start..];
    if body.len() % (ROW_WIDTH * 2) != 0 {
        return Err(bad_npy(path, "body size is not a whole number of rows"));
    }
    let mut rows = Vec::with_capacity(body.len() / (ROW_WIDTH * 2));
    for chunk in body.chunks_exact(ROW_WIDTH * 2) {
        let mut row = [0u16; ROW_WIDTH];
        for (i, pair) in chunk.chunks_exact(2).enumerate() {
            row[i] = u16::from_le_bytes([pair[0], pair[1]]);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moshaf::MoshafConfig;
    use crate::quran::Aya;
    use pretty_assertions::assert_eq;

    fn tiny_corpus() -> QuranCorpus {
        QuranCorpus::from_ayat(vec![
            Aya::new(1, 1, "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ"),
            Aya::new(112, 3, "لَمْ يَلِدْ وَلَمْ يُولَدْ"),
        ])
    }

    fn build() -> PhonemeIndex {
        let phonetizer = Phonetizer::new(MoshafConfig::default()).expect("pipeline");
        build_index(&tiny_corpus(), &phonetizer).expect("index")
    }

    #[test]
    fn norm_length_matches_row_count() {
        let index = build();
        assert_eq!(index.ref_norm.chars().count(), index.rows.len());
        assert!(!index.rows.is_empty());
    }

    #[test]
    fn rows_carry_sura_and_aya() {
        let index = build();
        assert_eq!(index.rows[0][0], 1);
        assert_eq!(index.rows[0][1], 1);
        let last = index.rows.last().unwrap();
        assert_eq!(last[0], 112);
        assert_eq!(last[1], 3);
    }

    #[test]
    fn phoneme_offsets_are_per_aya_and_contiguous() {
        let index = build();
        let mut prev_end = 0u16;
        for row in &index.rows {
            if row[0] == 1 {
                assert_eq!(row[5], prev_end, "groups must tile the aya stream");
                prev_end = row[6];
            }
        }
    }

    #[test]
    fn word_index_advances_at_boundaries() {
        let index = build();
        let words: Vec<u16> = index
            .rows
            .iter()
            .filter(|r| r[0] == 1)
            .map(|r| r[2])
            .collect();
        // Four words in the basmala.
        assert_eq!(*words.last().unwrap(), 3);
        assert!(words.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn npy_round_trip() {
        let index = build();
        let dir = std::env::temp_dir().join(format!("qp-index-{}", std::process::id()));
        index.save(&dir).expect("save");
        let loaded = PhonemeIndex::load(&dir).expect("load");
        assert_eq!(loaded, index);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_index_is_rejected() {
        let index = build();
        let dir = std::env::temp_dir().join(format!("qp-corrupt-{}", std::process::id()));
        index.save(&dir).expect("save");
        // Chop one codepoint off the reference corpus.
        let ref_path = dir.join(REF_NORM_FILE);
        let mut text = std::fs::read_to_string(&ref_path).unwrap();
        text.pop();
        std::fs::write(&ref_path, text).unwrap();
        let err = PhonemeIndex::load(&dir).unwrap_err();
        assert!(matches!(err, PhoneticsError::IndexCorrupt { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_index_is_reported() {
        let dir = std::env::temp_dir().join("qp-definitely-missing");
        let err = PhonemeIndex::load(&dir).unwrap_err();
        assert!(matches!(err, PhoneticsError::IndexMissing(_)));
    }

    #[test]
    fn boundary_extraction_requires_deleted_spaces() {
        let phonetizer = Phonetizer::new(MoshafConfig::default()).expect("pipeline");
        let uth = "لَكُم مَّا";
        let out = phonetizer.phonetize(uth, true).expect("phonetize");
        let bounds = word_boundaries_in_phonemes(uth, &out.mapping).expect("bounds");
        assert_eq!(bounds.len(), 1);
    }

    #[test]
    fn inversion_covers_every_phoneme_position() {
        let phonetizer = Phonetizer::new(MoshafConfig::default()).expect("pipeline");
        let out = phonetizer.phonetize("لَكُم مَّا", true).expect("phonetize");
        let table = phonetic_to_uthmani(&out.mapping);
        let ph_len = out.phonemes.chars().count();
        assert_eq!(table.len(), ph_len + 1);
        assert_eq!(table[ph_len] as usize, out.mapping.len());
    }
}
