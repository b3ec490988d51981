//! Qur'an corpus access: aya records, ordered iteration, lookups.
//!
//! The corpus itself is data, not code; it loads from a JSON file of
//! `{"sura", "aya", "uthmani"}` records in canonical order. Tests build
//! small in-memory corpora instead.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::alphabet::uthmani;
use crate::error::{PhoneticsError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aya {
    #[serde(rename = "sura")]
    pub sura_idx: u16,
    #[serde(rename = "aya")]
    pub aya_idx: u16,
    pub uthmani: String,
}

impl Aya {
    pub fn new(sura_idx: u16, aya_idx: u16, uthmani: &str) -> Self {
        Self {
            sura_idx,
            aya_idx,
            uthmani: uthmani.to_owned(),
        }
    }

    pub fn uthmani_words(&self) -> Vec<String> {
        self.uthmani
            .split(uthmani::SPACE)
            .filter(|w| !w.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Collapse runs of whitespace to single Uthmani spaces and trim the ends.
pub fn clean_uthmani_spaces(text: &str) -> String {
    let collapsed = Regex::new(r"\s+")
        .expect("static pattern")
        .replace_all(text, " ")
        .into_owned();
    collapsed.trim_matches(' ').to_owned()
}

#[derive(Debug, Clone)]
pub struct QuranCorpus {
    ayat: Vec<Aya>,
}

impl QuranCorpus {
    pub fn from_ayat(ayat: Vec<Aya>) -> Self {
        Self { ayat }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            PhoneticsError::CorpusError(format!("cannot open {}: {e}", path.display()))
        })?;
        let ayat: Vec<Aya> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PhoneticsError::CorpusError(format!("bad corpus json: {e}")))?;
        if ayat.is_empty() {
            return Err(PhoneticsError::CorpusError("corpus is empty".into()));
        }
        Ok(Self { ayat })
    }

    pub fn len(&self) -> usize {
        self.ayat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ayat.is_empty()
    }

    pub fn get(&self, sura: u16, aya: u16) -> Option<&Aya> {
        self.ayat
            .iter()
            .find(|a| a.sura_idx == sura && a.aya_idx == aya)
    }

    /// Ayat in canonical order.
    pub fn ayat(&self) -> impl Iterator<Item = &Aya> {
        self.ayat.iter()
    }

    /// Ayat from the given position onward, inclusive, in canonical order.
    pub fn ayat_after(&self, sura: u16, aya: u16) -> impl Iterator<Item = &Aya> {
        let start = self
            .ayat
            .iter()
            .position(|a| a.sura_idx == sura && a.aya_idx == aya)
            .unwrap_or(self.ayat.len());
        self.ayat[start..].iter()
    }
}
