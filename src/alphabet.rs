//! Codepoint tables for the Uthmani orthography and the phonetic script.
//!
//! Everything downstream (operation patterns, the mapping post-passes, the
//! sifat classifier) is written against these constants, never against
//! literal characters, so the two scripts stay consistent across the crate.

/// Uthmani orthography codepoints as they appear in the source text.
pub mod uthmani {
    pub const SPACE: char = ' ';

    pub const HAMZA: char = 'ء';
    pub const ALIF_MADDA: char = 'آ';
    pub const ALIF_HAMZA_ABOVE: char = 'أ';
    pub const WAW_HAMZA: char = 'ؤ';
    pub const ALIF_HAMZA_BELOW: char = 'إ';
    pub const YAA_HAMZA: char = 'ئ';
    pub const ALIF: char = 'ا';
    pub const ALIF_MAKSORA: char = 'ى';
    pub const HAMZAT_WASL: char = 'ٱ';
    pub const TAA_MARBOTA: char = 'ة';

    pub const FATHA: char = '\u{064E}';
    pub const DAMA: char = '\u{064F}';
    pub const KASRA: char = '\u{0650}';
    pub const SHADDA: char = '\u{0651}';
    /// Sukun as drawn in the Uthmani script (a small head of khaa).
    pub const RAS_HAAA: char = '\u{0652}';

    pub const TANWEEN_FATH: char = '\u{064B}';
    pub const TANWEEN_DAM: char = '\u{064C}';
    pub const TANWEEN_KASR: char = '\u{064D}';
    /// Small low meem written under a sequential (idgham/ikhfa) tanween.
    pub const TANWEEN_IDHAAM_DTERMINER: char = '\u{06ED}';
    /// Small high meem: iqlab marker over noon or tanween.
    pub const MEEM_IQLAB: char = '\u{06E2}';

    pub const MADDA: char = '\u{0653}';
    pub const HAMZA_ABOVE: char = '\u{0654}';
    pub const HAMZA_BELOW: char = '\u{0655}';
    pub const DAGGER_ALIF: char = '\u{0670}';
    pub const KASHEEDA: char = '\u{0640}';

    pub const SMALL_WAW: char = '\u{06E5}';
    pub const SMALL_YAA: char = '\u{06E6}';
    pub const SMALL_HIGH_YAA: char = '\u{06E7}';
    pub const SMALL_HIGH_NOON: char = '\u{06E8}';
    /// Small high seen: the sakt sign.
    pub const SAKT: char = '\u{06DC}';
    /// Small high rounded zero over a silent letter.
    pub const SKOON_MOSTADEER: char = '\u{06DF}';
    /// Small high rectangular zero: silent in wasl, read in waqf.
    pub const SKOON_MOSTATEEL: char = '\u{06E0}';
    /// Hamza resting on the line after tasheel (open hamza).
    pub const HAMZA_MOTAHARKA: char = '\u{0672}';
    /// Low stop written under the imala raa.
    pub const IMALA_SIGN: char = '\u{06EA}';
    /// Rounded high stop: tasheel mark over alif.
    pub const TASHEEL_SIGN: char = '\u{06EC}';

    /// Base consonant skeleton, hamza forms included.
    pub const LETTERS_GROUP: &str =
        "ءآأؤإئابتثجحخدذرزسشصضطظعغفقكلمنهوىية";

    pub const HAMAZAT_GROUP: &str = "ءأإؤئ";

    pub const HARAKAT_GROUP: &str = "\u{064E}\u{064F}\u{0650}";

    /// Letters an unvowelled noon hides before (ikhfa).
    pub const IKHFAA_GROUP: &str = "تثجدذزسشصضطظفقك";

    /// Letters a qalqalah bounce attaches to.
    pub const QALQALAH_GROUP: &str = "قطبجد";
}

/// Phonetic script codepoints produced by the pipeline.
pub mod phonetics {
    /// Madd alif; doubled per elongation beat.
    pub const ALIF: char = 'ا';
    /// Madd waw, written small; doubled per beat.
    pub const WAW_MADD: char = '\u{06E5}';
    /// Madd yaa, written small; doubled per beat.
    pub const YAA_MADD: char = '\u{06E6}';
    /// Qalqalah bounce marker, written after the bounced letter.
    pub const QLQLA: char = 'ڇ';
    /// Sakt: a breathless pause marker.
    pub const SAKT: char = '\u{06DC}';
    /// Hidden noon (ikhfa hum), tripled.
    pub const NOON_MOKHFAH: char = 'ں';
    /// Hidden meem (iqlab / ikhfa shafawi hum), tripled.
    pub const MEEM_MOKHFAH: char = '۾';
    /// Tasheel-articulated hamza.
    pub const HAMZA_MOSAHALA: char = '\u{0672}';
    /// Imala vowel, doubled like a madd.
    pub const IMALA: char = 'ے';

    pub const FATHA: char = '\u{064E}';
    pub const DAMA: char = '\u{064F}';
    pub const KASRA: char = '\u{0650}';

    /// Every codepoint the final phonetic script may contain, space aside.
    pub const ALPHABET: &str = "ءابتثجحخدذرزسشصضطظعغفقكلمنهويىٱ\
\u{064E}\u{064F}\u{0650}\u{06E5}\u{06E6}اڇ\u{06DC}ں۾\u{0672}ے\u{06EA}";
}

/// Character classes used by the phoneme-group chunker.
pub mod phonetic_groups {
    /// Short vowels that close a phoneme group.
    pub const HARAKAT: &str = "\u{064E}\u{064F}\u{0650}";

    /// Codepoints that extend the current group instead of opening one:
    /// vowels, madd letters, hums and articulation markers.
    pub const RESIDUALS: &str =
        "\u{064E}\u{064F}\u{0650}ا\u{06E5}\u{06E6}ڇ\u{06DC}ے\u{06EA} ";
}

/// True when `c` opens a new phoneme group in the phonetic script.
pub fn is_group_start(c: char) -> bool {
    !phonetic_groups::RESIDUALS.contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residuals_and_group_starts_are_disjoint() {
        for c in phonetic_groups::RESIDUALS.chars() {
            assert!(!is_group_start(c), "residual {c:?} must not open a group");
        }
        for c in ['ب', 'ن', 'م', 'ء', 'ں', '۾', phonetics::HAMZA_MOSAHALA] {
            assert!(is_group_start(c), "{c:?} must open a group");
        }
    }

    #[test]
    fn qalqalah_letters_are_base_letters() {
        for c in uthmani::QALQALAH_GROUP.chars() {
            assert!(
                uthmani::LETTERS_GROUP.contains(c),
                "qalqalah letter {c:?} missing from the letter skeleton"
            );
        }
    }

    #[test]
    fn madd_letters_are_residuals() {
        for c in [phonetics::ALIF, phonetics::WAW_MADD, phonetics::YAA_MADD] {
            assert!(phonetic_groups::RESIDUALS.contains(c));
        }
    }
}
