//! Phoneme-group chunking and the sifat (articulation attributes) projector.
//!
//! A phoneme group is one sounding letter plus everything that rides on it:
//! its short vowel, madd letters, the qalqalah bounce, a sakt sign. The
//! chunker is shared by the index builder, the search normaliser and the
//! error explainer, so its grouping convention is part of the persisted
//! index format.

use serde::{Deserialize, Serialize};

use crate::alphabet::{is_group_start, phonetics};
use crate::moshaf::{MoshafConfig, TafkheemOrTarqeeq};

/// Split a phonetic script into phoneme groups.
///
/// Every group opens with a sounding codepoint; vowels, madd letters and
/// markers attach to the group before them. A leading residual (which only a
/// malformed stream produces) opens its own group rather than being lost.
pub fn chunk_phonemes(phonemes: &str) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for c in phonemes.chars() {
        if is_group_start(c) || groups.is_empty() {
            groups.push(c.to_string());
        } else {
            groups.last_mut().expect("nonempty").push(c);
        }
    }
    groups
}

/// First codepoint of every group: the normalized form used by the search
/// index.
pub fn normalize_phonetic_groups(groups: &[String]) -> String {
    groups
        .iter()
        .filter_map(|g| g.chars().next())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HamsOrJahr {
    Hams,
    Jahr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiddaOrRakhawa {
    Shadeed,
    Between,
    Rikhw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TafkheemOrTaqeeq {
    Mofakham,
    Moraqaq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Itbaq {
    Motbaq,
    Monfateh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Safeer {
    Safeer,
    NoSafeer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qalqla {
    Moqalqal,
    NotMoqalqal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tikraar {
    Mokarar,
    NotMokarar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tafashie {
    Motafashie,
    NotMotafashie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Istitala {
    Mostateel,
    NotMostateel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ghonna {
    Maghnoon,
    NotMaghnoon,
}

/// Per-group articulation attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SifaOutput {
    pub phonemes: String,
    pub hams_or_jahr: HamsOrJahr,
    pub shidda_or_rakhawa: ShiddaOrRakhawa,
    pub tafkheem_or_taqeeq: TafkheemOrTaqeeq,
    pub itbaq: Itbaq,
    pub safeer: Safeer,
    pub qalqla: Qalqla,
    pub tikraar: Tikraar,
    pub tafashie: Tafashie,
    pub istitala: Istitala,
    pub ghonna: Ghonna,
}

const HAMS_LETTERS: &[char] = &['ف', 'ح', 'ث', 'ه', 'ش', 'خ', 'ص', 'س', 'ك', 'ت'];
const SHIDDA_LETTERS: &[char] = &['ء', 'ج', 'د', 'ق', 'ط', 'ب', 'ك', 'ت'];
const BETWEEN_LETTERS: &[char] = &['ل', 'ن', 'ع', 'م', 'ر'];
const ALWAYS_MOFAKHAM: &[char] = &['خ', 'ص', 'ض', 'غ', 'ط', 'ق', 'ظ'];
const ITBAQ_LETTERS: &[char] = &['ص', 'ض', 'ط', 'ظ'];
const SAFEER_LETTERS: &[char] = &['ص', 'س', 'ز'];
const QALQALAH_LETTERS: &[char] = &['ق', 'ط', 'ب', 'ج', 'د'];

/// Raa words with a reader's choice between tafkheem and tarqeeq.
fn raa_choice(moshaf: &MoshafConfig, uthmani: &str) -> TafkheemOrTarqeeq {
    let table: &[(&str, TafkheemOrTarqeeq)] = &[
        ("فِرْق", moshaf.raa_firq),
        ("ٱلْقِطْر", moshaf.raa_alqitr),
        ("مِصْر", moshaf.raa_misr),
        ("نُذُر", moshaf.raa_nudhur),
        ("يَسْر", moshaf.raa_yasr),
    ];
    for (word, choice) in table {
        if uthmani.contains(word) {
            return *choice;
        }
    }
    TafkheemOrTarqeeq::Tafkheem
}

fn classify_tafkheem(
    letter: char,
    group: &str,
    prev_group: Option<&str>,
    moshaf: &MoshafConfig,
    uthmani: &str,
) -> TafkheemOrTaqeeq {
    if ALWAYS_MOFAKHAM.contains(&letter) {
        return TafkheemOrTaqeeq::Mofakham;
    }
    match letter {
        'ر' => {
            // Raa thins after a kasra or a yaa madd; configured words follow
            // the reader's choice.
            let thin_context = prev_group.is_some_and(|g| {
                g.ends_with(phonetics::KASRA) || g.ends_with(phonetics::YAA_MADD)
            });
            if thin_context || raa_choice(moshaf, uthmani) == TafkheemOrTarqeeq::Tarqeeq {
                TafkheemOrTaqeeq::Moraqaq
            } else {
                TafkheemOrTaqeeq::Mofakham
            }
        }
        'ل' => {
            // The lam of the name of Allah thickens after fatha or damma.
            let in_ism_allah = group.starts_with('ل')
                && group.chars().nth(1).is_none()
                && prev_group
                    .is_some_and(|g| g.ends_with(phonetics::FATHA) || g.ends_with(phonetics::DAMA));
            if in_ism_allah {
                TafkheemOrTaqeeq::Mofakham
            } else {
                TafkheemOrTaqeeq::Moraqaq
            }
        }
        _ => TafkheemOrTaqeeq::Moraqaq,
    }
}

/// Project the sifat of every phoneme group of `phonemes`.
///
/// `uthmani` only feeds the word-level raa choices; the classification
/// itself reads the phonetic stream.
pub fn process_sifat(uthmani: &str, phonemes: &str, moshaf: &MoshafConfig) -> Vec<SifaOutput> {
    let groups = chunk_phonemes(phonemes);
    let mut out = Vec::with_capacity(groups.len());

    for (i, group) in groups.iter().enumerate() {
        let letter = match group.chars().next() {
            Some(c) => c,
            None => continue,
        };
        let prev_group = if i > 0 { Some(groups[i - 1].as_str()) } else { None };

        let hums = letter == phonetics::NOON_MOKHFAH || letter == phonetics::MEEM_MOKHFAH;
        let doubled_nasal = (letter == 'ن' || letter == 'م')
            && prev_group.is_some_and(|g| g.starts_with(letter));

        out.push(SifaOutput {
            phonemes: group.clone(),
            hams_or_jahr: if HAMS_LETTERS.contains(&letter) {
                HamsOrJahr::Hams
            } else {
                HamsOrJahr::Jahr
            },
            shidda_or_rakhawa: if SHIDDA_LETTERS.contains(&letter) {
                ShiddaOrRakhawa::Shadeed
            } else if BETWEEN_LETTERS.contains(&letter) {
                ShiddaOrRakhawa::Between
            } else {
                ShiddaOrRakhawa::Rikhw
            },
            tafkheem_or_taqeeq: classify_tafkheem(letter, group, prev_group, moshaf, uthmani),
            itbaq: if ITBAQ_LETTERS.contains(&letter) {
                Itbaq::Motbaq
            } else {
                Itbaq::Monfateh
            },
            safeer: if SAFEER_LETTERS.contains(&letter) {
                Safeer::Safeer
            } else {
                Safeer::NoSafeer
            },
            qalqla: if QALQALAH_LETTERS.contains(&letter) && group.contains(phonetics::QLQLA) {
                Qalqla::Moqalqal
            } else {
                Qalqla::NotMoqalqal
            },
            tikraar: if letter == 'ر' {
                Tikraar::Mokarar
            } else {
                Tikraar::NotMokarar
            },
            tafashie: if letter == 'ش' {
                Tafashie::Motafashie
            } else {
                Tafashie::NotMotafashie
            },
            istitala: if letter == 'ض' {
                Istitala::Mostateel
            } else {
                Istitala::NotMostateel
            },
            ghonna: if hums || doubled_nasal {
                Ghonna::Maghnoon
            } else {
                Ghonna::NotMaghnoon
            },
        });
    }
    out
}
