//! The rewrite operations of the phonetizer pipeline.
//!
//! Every operation is an ordered list of `(pattern, replacement, rule)` rows
//! applied through the mapping engine. Patterns are data: the engine never
//! interprets their meaning, it only preserves the character mapping across
//! them. Rows that depend on the Moshaf configuration are materialised at
//! construction time, so compiled patterns are static afterwards.
//!
//! Replacement templates use `${n}` group references only; the regex crate
//! has no look-around or pattern backreferences, and none are needed here.

use std::collections::HashSet;

use regex::Regex;

use crate::error::{PhoneticsError, Result};
use crate::mapping::{sub_with_mapping, MappingList};
use crate::moshaf::{
    AnfalTawbaChoice, FathOrDam, HadhfOrIthbat, IdghamChoice, IshmamOrRawm, MeemAalImran,
    MeemMokhfahChoice, MoshafConfig, SaktChoice, SeenOrSaad, TasheelOrMadd,
};
use crate::rules::{MaddTag, RuleKind, TajweedRule};

/// One compiled rewrite row.
pub struct Rewrite {
    pub pattern: Regex,
    pub replacement: String,
    pub rule: Option<TajweedRule>,
}

/// Whether dependency operations run before this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Inference,
    /// Recursively apply `ops_before` (minus a discard set) first, each
    /// dependency resolving its own chain the same way; used by tests that
    /// exercise one operation in isolation on raw Uthmani text.
    Test,
}

pub struct Operation {
    pub arabic_name: &'static str,
    pub rewrites: Vec<Rewrite>,
    pub ops_before: &'static [&'static str],
}

impl Operation {
    /// Run every rewrite row over `text`, threading the mapping through.
    pub fn forward(
        &self,
        text: &str,
        mappings: Option<MappingList>,
    ) -> Result<(String, MappingList)> {
        let mut text = text.to_owned();
        let mut mappings = mappings;
        for rewrite in &self.rewrites {
            let (next, m) = sub_with_mapping(
                &rewrite.pattern,
                &rewrite.replacement,
                &text,
                mappings,
                rewrite.rule.as_ref(),
            )?;
            text = next;
            mappings = if m.is_empty() { None } else { Some(m) };
        }
        Ok((text, mappings.unwrap_or_default()))
    }
}

// Pipeline order; also the vocabulary for `ops_before`.
pub const DISASSEMBLE_HROF_MOQATTA: &str = "تفكيك الحروف المقطعة";
pub const SPECIAL_CASES: &str = "الحالات الخاصة";
pub const BEGIN_WITH_HAMZAT_WASL: &str = "البدء بهمزة الوصل";
pub const CONVERT_ALIF_MAKSORA: &str = "تحويل الألف المقصورة";
pub const NORMALIZE_HMAZAT: &str = "توحيد الهمزات";
pub const ITHBAT_YAA_YOHIE: &str = "إثبات ياء يحيي";
pub const REMOVE_KASHEEDA: &str = "إزالة الكشيدة";
pub const REMOVE_HMZAT_WASL_MIDDLE: &str = "حذف همزة الوصل وسط الكلام";
pub const REMOVE_SKOON_MOSTADEER: &str = "حذف السكون المستدير";
pub const SKOON_MOSTATEEL: &str = "السكون المستطيل";
pub const MADD_ALEWAD: &str = "مد العوض";
pub const WAW_ALSALAH: &str = "واو الصلاة";
pub const ENLARGE_SMALL_LETTERS: &str = "تكبير الحروف الصغيرة";
pub const CLEAN_END: &str = "تنظيف نهاية الآية";
pub const NORMALIZE_TAA: &str = "توحيد التاءات";
pub const ADD_ALIF_ISM_ALLAH: &str = "ألف لفظ الجلالة";
pub const PREPARE_GHONNA_IDGHAM_IQLAB: &str = "تهيئة الغنة والإدغام والإقلاب";
pub const ILTIQAA_ALSAKNAN: &str = "التقاء الساكنين";
pub const GHONNA: &str = "الغنة";
pub const TASHEEL: &str = "التسهيل";
pub const IMALA: &str = "الإمالة";
pub const MADD: &str = "المد";
pub const QALQLA: &str = "القلقلة";

pub const OPERATION_ORDER: &[&str] = &[
    DISASSEMBLE_HROF_MOQATTA,
    SPECIAL_CASES,
    BEGIN_WITH_HAMZAT_WASL,
    CONVERT_ALIF_MAKSORA,
    NORMALIZE_HMAZAT,
    ITHBAT_YAA_YOHIE,
    REMOVE_KASHEEDA,
    REMOVE_HMZAT_WASL_MIDDLE,
    REMOVE_SKOON_MOSTADEER,
    SKOON_MOSTATEEL,
    MADD_ALEWAD,
    WAW_ALSALAH,
    ENLARGE_SMALL_LETTERS,
    CLEAN_END,
    NORMALIZE_TAA,
    ADD_ALIF_ISM_ALLAH,
    PREPARE_GHONNA_IDGHAM_IQLAB,
    ILTIQAA_ALSAKNAN,
    GHONNA,
    TASHEEL,
    IMALA,
    MADD,
    QALQLA,
];

type RowSpec = (String, String, Option<TajweedRule>);

fn row(pattern: &str, replacement: &str) -> RowSpec {
    (pattern.to_owned(), replacement.to_owned(), None)
}

fn ruled(pattern: &str, replacement: &str, rule: TajweedRule) -> RowSpec {
    (pattern.to_owned(), replacement.to_owned(), Some(rule))
}

fn beats(c: char, n: u8) -> String {
    std::iter::repeat(c).take(n as usize).collect()
}

fn madd_rule(kind: RuleKind, golden: u8, tag: MaddTag) -> TajweedRule {
    TajweedRule::new(kind, golden as u16).with_tag(tag)
}

// ---------------------------------------------------------------------------
// Row tables, one builder per operation.
// ---------------------------------------------------------------------------

fn disassemble_hrof_moqatta(moshaf: &MoshafConfig) -> Vec<RowSpec> {
    let mut rows = Vec::new();

    rows.push(row(
        "(^| )كٓهيعٓصٓ( |$)",
        "${1}كَآفْ هَا يَا عَيٓن صَآدْ${2}",
    ));
    rows.push(row("(^| )الٓمٓصٓ( |$)", "${1}أَلِفْ لَآم مِّيٓم صَآدْ${2}"));
    rows.push(row("(^| )الٓمٓر( |$)", "${1}أَلِفْ لَآم مِّيٓم رَا${2}"));
    rows.push(row("(^| )الٓر( |$)", "${1}أَلِفْ لَآم رَا${2}"));

    // Aal-Imran opens with the disjoined meem running into the name of Allah;
    // in wasl the pausal sukun becomes a fatha and the madd shortens or keeps
    // its six beats by choice.
    match moshaf.meem_aal_imran {
        MeemAalImran::Wasl6 => rows.push(row(
            "(^| )الٓمٓ ٱللَّه",
            "${1}أَلِفْ لَآم مِّيٓمَ ٱللَّه",
        )),
        MeemAalImran::Wasl2 => rows.push(row(
            "(^| )الٓمٓ ٱللَّه",
            "${1}أَلِفْ لَآم مِّيمَ ٱللَّه",
        )),
        MeemAalImran::Waqf => {}
    }
    rows.push(row("(^| )الٓمٓ( |$)", "${1}أَلِفْ لَآم مِّيٓمْ${2}"));

    rows.push(row("(^| )طسٓمٓ( |$)", "${1}طَا سِيٓم مِّيٓمْ${2}"));
    rows.push(row("(^| )طسٓ( |$)", "${1}طَا سِيٓنْ${2}"));
    rows.push(row("(^| )طه( |$)", "${1}طَا هَا${2}"));
    rows.push(row("(^| )عٓسٓقٓ( |$)", "${1}عَيٓن سِيٓن قَآفْ${2}"));
    rows.push(row("(^| )حمٓ( |$)", "${1}حَا مِيٓمْ${2}"));
    match moshaf.noon_and_yaseen {
        // Bare final noon lets the ghonna pass assimilate it into the waw
        // that opens the next aya.
        IdghamChoice::Idgham => {
            rows.push(row("(^| )يسٓ وَ", "${1}يَا سِيٓن وَ"));
            rows.push(row("(^| )نٓ وَ", "${1}نُوٓن وَ"));
        }
        IdghamChoice::Izhar => {}
    }
    rows.push(row("(^| )يسٓ( |$)", "${1}يَا سِيٓنْ${2}"));
    rows.push(row("(^| )صٓ( |$)", "${1}صَآدْ${2}"));
    rows.push(row("(^| )قٓ( |$)", "${1}قَآفْ${2}"));
    rows.push(row("(^| )نٓ( |$)", "${1}نُوٓنْ${2}"));

    rows
}

fn special_cases(moshaf: &MoshafConfig) -> Vec<RowSpec> {
    let mut rows = Vec::new();

    match moshaf.sakt_iwaja {
        SaktChoice::Sakt => rows.push(row("عِوَجَا قَيِّمً", "عِوَجَاۜ قَيِّمً")),
        SaktChoice::Idraj => rows.push(row("عِوَجَا قَيِّمً", "عِوَجًۭا قَيِّمً")),
    }
    if moshaf.sakt_marqdena == SaktChoice::Sakt {
        rows.push(row("مَّرْقَدِنَا هَـٰذَا", "مَّرْقَدِنَاۜ هَـٰذَا"));
    }
    if moshaf.sakt_man_raq == SaktChoice::Sakt {
        rows.push(row("مَن رَّاق", "مَنْۜ رَاق"));
    }
    if moshaf.sakt_bal_ran == SaktChoice::Sakt {
        rows.push(row("بَل رَّانَ", "بَلْۜ رَانَ"));
    }
    if moshaf.sakt_maleeyah == SaktChoice::Sakt {
        rows.push(row("مَالِيَهْ هَلَكَ", "مَالِيَهْۜ هَلَكَ"));
    }
    if moshaf.between_anfal_and_tawba == AnfalTawbaChoice::Sakt {
        rows.push(row("عَلِيمٌۢ بَرَآءَة", "عَلِيمْۜ بَرَآءَة"));
    }

    match moshaf.yabsut {
        SeenOrSaad::Seen => rows.push(row("بْصُۜط", "بْسُط")),
        SeenOrSaad::Saad => rows.push(row("بْصُۜط", "بْصُط")),
    }
    match moshaf.bastah {
        SeenOrSaad::Seen => rows.push(row("بَصْۜطَة", "بَسْطَة")),
        SeenOrSaad::Saad => rows.push(row("بَصْۜطَة", "بَصْطَة")),
    }
    match moshaf.almusaytirun {
        SeenOrSaad::Seen => rows.push(row("ٱلْمُصَۜيْطِرُون", "ٱلْمُسَيْطِرُون")),
        SeenOrSaad::Saad => rows.push(row("ٱلْمُصَۜيْطِرُون", "ٱلْمُصَيْطِرُون")),
    }
    match moshaf.bimusaytir {
        SeenOrSaad::Seen => rows.push(row("بِمُصَۜيْطِر", "بِمُسَيْطِر")),
        SeenOrSaad::Saad => rows.push(row("بِمُصَۜيْطِر", "بِمُصَيْطِر")),
    }

    if moshaf.yalhath_dhalik == IdghamChoice::Idgham {
        rows.push(row("يَلْهَثْ? ذَّ", "يَلْهَذَّ"));
    }
    if moshaf.irkab_maana == IdghamChoice::Idgham {
        rows.push(row("رْكَب مَّعَنَا", "رْكَمَّعَنَا"));
    }
    if moshaf.idgham_nakhluqkum == IdghamChoice::Idgham {
        rows.push(row("نَخْلُقكُّم", "نَخْلُكُّم"));
    }

    match moshaf.noon_tamnna {
        IshmamOrRawm::Ishmam => rows.push(row("تَأْمَ\u{06EB}نَّا", "تَأْمَنَّا")),
        IshmamOrRawm::Rawm => rows.push(row("تَأْمَ\u{06EB}نَّا", "تَأْمَنُنَا")),
    }
    if moshaf.harakat_daaf == FathOrDam::Dam {
        rows.push(row("ضَعْف", "ضُعْف"));
    }
    if moshaf.alif_salasila == HadhfOrIthbat::Ithbat {
        rows.push(row("سَلَـٰسِلَا۟$", "سَلَـٰسِلَا"));
    }
    if moshaf.yaa_ataan == HadhfOrIthbat::Ithbat {
        rows.push(row("ءَاتَىٰنِ ", "ءَاتَىٰنِى "));
    }
    match moshaf.start_with_ism {
        HadhfOrIthbat::Hadhf => rows.push(row("^ٱلِٱسْمُ", "لِسْمُ")),
        HadhfOrIthbat::Ithbat => rows.push(row("^ٱلِٱسْمُ", "أَلِسْمُ")),
    }

    rows
}

fn begin_with_hamzat_wasl(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        row("^ٱلل", "أَلل"),
        row("^ٱلْ", "أَلْ"),
        // Third-radical damma pulls the opening hamza to a damma.
        row("^ٱ(.ْ?.)ُ", "أُ${1}ُ"),
        row("^ٱ", "إِ"),
        // A text starting inside a word at a silent lam gets a kasra.
        row("^لْ", "لِ"),
    ]
}

fn convert_alif_maksora(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        // Silent maksora after tanween fath disappears.
        row("(ً[ۭۢ]?)ى", "${1}"),
        // Maksora carrying the dagger alif is the long a.
        row("ىٰ", "ا"),
        // Vowelled, geminated, madda-marked or sakin maksora is a real yaa.
        row("ى([ًٌٍَُِّ])", "ي${1}"),
        row("ىٓ", "يٓ"),
        row("ىْ", "يْ"),
        // What remains is the word-final bare maksora after a kasra.
        row("ِى", "ِي"),
    ]
}

fn normalize_hmazat(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        // Decompose the precomposed madda alif so the madd rows see one form.
        row("آ", "ا\u{0653}"),
        // A combining hamza rides after its haraka; the spoken hamza comes
        // before it.
        row("([ًٌٍَُِ])\u{0654}", "ء${1}"),
        row("\u{0654}", "ء"),
        row("\u{0655}", "ء"),
        row("[أإؤئ]", "ء"),
    ]
}

fn ithbat_yaa_yohie(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // The verb forms of "gives life" keep their trimmed yaa sounded.
    vec![row("ُحْيِ( |$)", "ُحْيِي${1}")]
}

fn remove_kasheeda(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![row("ـ([^ٰۧۨ])", "${1}"), row("ـ$", "")]
}

fn remove_hmzat_wasl_middle(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![row("(.)ٱ", "${1}")]
}

fn remove_skoon_mostadeer(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // The letter under the rounded zero is silent in wasl and waqf alike.
    vec![row("(.)۟", "")]
}

fn skoon_mostateel(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // Silent in wasl, kept in waqf.
    vec![row("ا۠ ", " "), row("۠", "")]
}

fn madd_alewad(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        // Pausal tanween fath becomes a two-beat alif.
        row("ً[ۭۢ]?ا?$", "َا"),
        // In wasl the seat alif of the tanween is silent.
        row("ً([ۭۢ]?)ا ", "ً${1} "),
    ]
}

fn waw_alsalah(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // The archaic waw of as-salah, az-zakah and their sisters sounds as alif.
    vec![row("وٰ", "ا")]
}

fn enlarge_small_letters(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        // Pausal silat haa drops its small vowel.
        row("هُۥٓ?$", "هُ"),
        row("هِۦٓ?$", "هِ"),
        row("ـ([ٰۧۨ])", "${1}"),
        row("ٰ([^ٓ])", "ا${1}"),
        row("ٰ$", "ا"),
        row("ۥ", "و"),
        row("ۦ", "ي"),
        row("ۧ", "ي"),
        row("ۨ", "ن"),
        row("ـ", ""),
    ]
}

fn clean_end(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        row("[ًٌٍَُِ][ۭۢ]?$", ""),
        // A pausal alif madd loses its mark and falls back to two beats.
        row("آ$", "ا"),
    ]
}

fn normalize_taa(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![row("ة$", "ه"), row("ةْ$", "هْ"), row("ة", "ت")]
}

fn add_alif_ism_allah(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // The name of Allah hides a long alif the orthography never writes.
    vec![
        row("ل(ِ?)لَّه([َُِ])( )", "ل${1}لَّاه${2}${3}"),
        row("ل(ِ?)لَّه([َُِ]?)$", "ل${1}لَّاه${2}"),
    ]
}

fn prepare_ghonna_idgham_iqlab(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    vec![
        // Identical letters across a word boundary assimilate; the written
        // shadda on the second letter already says so.
        row("ل لّ", "لّ"),
        row("ت تّ", "تّ"),
        row("د دّ", "دّ"),
        row("ذ ذّ", "ذّ"),
        row("ب بّ", "بّ"),
        // The silent article lam before a sun letter.
        row("ل([^ل ])ّ", "${1}ّ"),
        // Sakin lam assimilates into a geminated raa.
        row("ل (ر)ّ", "${1}ّ"),
        // Iqlab: noon or tanween turns into meem before baa.
        row("نۢ( ?)ب", "م${1}ب"),
        row("ً[ۭۢ]?( ?)ب", "َم${1}ب"),
        row("ٌ[ۭۢ]?( ?)ب", "ُم${1}ب"),
        row("ٍ[ۭۢ]?( ?)ب", "ِم${1}ب"),
        // Remaining mid-text tanween unfolds to a haraka plus noon; the
        // final-tanween case never reaches here (CleanEnd runs first).
        row("ً[ۭۢ]?(.)", "َن${1}"),
        row("ٌ[ۭۢ]?(.)", "ُن${1}"),
        row("ٍ[ۭۢ]?(.)", "ِن${1}"),
        // Noon assimilates without ghonna into geminated raa and lam.
        row("ن ([رل])ّ", "${1}ّ"),
    ]
}

fn iltiqaa_alsaknan(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // A word-final madd letter shortens away before a sakin onset.
    vec![
        row("[اويى] لل", " لل"),
        row("[اويى] ([^ ])ّ", " ${1}ّ"),
        row("[اويى] ([^ ])ْ", " ${1}ْ"),
    ]
}

fn ghonna(moshaf: &MoshafConfig) -> Vec<RowSpec> {
    let g = TajweedRule::ghonna;
    let mut rows = vec![
        ruled("ن نّ", "نننن", g()),
        ruled("ن مّ", "مممم", g()),
        ruled("م مّ", "مممم", g()),
        ruled("(.)نّ$", "${1}ننن", g()),
        ruled("(.)مّ$", "${1}ممم", g()),
        // A text-initial shadda has nothing before it to assimilate.
        ruled("(.)نّ", "${1}نننن", g()),
        ruled("(.)مّ", "${1}مممم", g()),
        ruled("ن ي", "ييي", g()),
        ruled("ن و", "ووو", g()),
    ];
    match moshaf.meem_mokhfah {
        MeemMokhfahChoice::Ikhfa => {
            rows.push(ruled("م ب", "۾۾۾ب", g()));
            rows.push(ruled("مب", "۾۾۾ب", g()));
        }
        MeemMokhfahChoice::Meem => {
            rows.push(ruled("م ب", "مممب", g()));
            rows.push(ruled("مب", "مممب", g()));
        }
    }
    rows.push(ruled("ن ([تثجدذزسشصضطظفقك])", "ںںں${1}", g()));
    rows.push(ruled("ن([تثجدذزسشصضطظفقك])", "ںںں${1}", g()));
    rows
}

fn tasheel(moshaf: &MoshafConfig) -> Vec<RowSpec> {
    let mut rows = vec![row("ا\u{06EC}", "\u{0672}")];
    if moshaf.tasheel_or_madd == TasheelOrMadd::Tasheel {
        // The interrogative hamza over a lazim madd eases instead.
        rows.push(row("ءَا\u{0653}", "ءَ\u{0672}"));
    }
    rows
}

fn imala(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    // The single imala of Hafs, in "majraha".
    vec![row("ر\u{06EA}ا", "رےے")]
}

fn madd(moshaf: &MoshafConfig) -> Vec<RowSpec> {
    let monfasel = moshaf.madd_monfasel_len;
    let mottasel = moshaf.madd_mottasel_len;
    let waqf = moshaf.madd_mottasel_waqf;
    let aared = moshaf.madd_aared_len;
    let alayn = moshaf.madd_yaa_alayn_alharfy;

    let lazem = |tag| madd_rule(RuleKind::LazemMadd, 6, tag);
    let mottasel_rule = |n, tag| madd_rule(RuleKind::MottaselMadd, n, tag);
    let monfasel_rule = |tag| madd_rule(RuleKind::MonfaselMadd, monfasel, tag);
    let aared_rule = |tag| madd_rule(RuleKind::AaredMadd, aared, tag);
    let normal = |tag| madd_rule(RuleKind::NormalMadd, 2, tag);

    let mut rows = Vec::new();

    // Lazim: six beats, always.
    rows.push(ruled(
        "آ([^ ])ّ",
        &format!("{}${{1}}ّ", beats('ا', 6)),
        lazem(MaddTag::Alif),
    ));
    rows.push(ruled("آم", &format!("{}م", beats('ا', 6)), lazem(MaddTag::Alif)));
    rows.push(ruled("آلْ", &format!("{}لْ", beats('ا', 6)), lazem(MaddTag::Alif)));
    rows.push(ruled(
        "عَيٓن",
        &format!("عَ{}ن", beats('ي', alayn.saturating_sub(1).max(1))),
        madd_rule(RuleKind::LazemMadd, alayn, MaddTag::Yaa),
    ));
    rows.push(ruled(
        "يٓ([^ ء])",
        &format!("{}${{1}}", beats('\u{06E6}', 6)),
        lazem(MaddTag::Yaa),
    ));
    rows.push(ruled(
        "وٓ([^ ء])",
        &format!("{}${{1}}", beats('\u{06E5}', 6)),
        lazem(MaddTag::Waw),
    ));

    // Mottasel: hamza in the same word; pausal variant first.
    rows.push(ruled(
        "آء$",
        &format!("{}ء", beats('ا', waqf)),
        mottasel_rule(waqf, MaddTag::Alif),
    ));
    rows.push(ruled(
        "آء",
        &format!("{}ء", beats('ا', mottasel)),
        mottasel_rule(mottasel, MaddTag::Alif),
    ));
    rows.push(ruled(
        "يٓء",
        &format!("{}ء", beats('\u{06E6}', mottasel)),
        mottasel_rule(mottasel, MaddTag::Yaa),
    ));
    rows.push(ruled(
        "وٓء",
        &format!("{}ء", beats('\u{06E5}', mottasel)),
        mottasel_rule(mottasel, MaddTag::Waw),
    ));
    // The dagger madd of ula'ika keeps its hamza inside the word.
    rows.push(ruled(
        "لَٰٓء",
        &format!("لَ{}ء", beats('ا', mottasel)),
        mottasel_rule(mottasel, MaddTag::Alif),
    ));

    // Monfasel: hamza opens the next word.
    rows.push(ruled(
        "ٰٓء",
        &format!("{}ء", beats('ا', monfasel)),
        monfasel_rule(MaddTag::Alif),
    ));
    rows.push(ruled(
        "آ (ء)",
        &format!("{} ${{1}}", beats('ا', monfasel)),
        monfasel_rule(MaddTag::Alif),
    ));
    rows.push(ruled(
        "يٓ (ء)",
        &format!("{} ${{1}}", beats('\u{06E6}', monfasel)),
        monfasel_rule(MaddTag::Yaa),
    ));
    rows.push(ruled(
        "وٓ (ء)",
        &format!("{} ${{1}}", beats('\u{06E5}', monfasel)),
        monfasel_rule(MaddTag::Waw),
    ));
    rows.push(ruled(
        "ٰٓ",
        &beats('ا', monfasel),
        monfasel_rule(MaddTag::Alif),
    ));

    // Aared: the pausal sukun stretches the last madd of the text.
    rows.push(ruled(
        "ِيٓ$",
        &format!("ِ{}", beats('\u{06E6}', aared)),
        aared_rule(MaddTag::Yaa),
    ));
    rows.push(ruled(
        "ُوٓ$",
        &format!("ُ{}", beats('\u{06E5}', aared)),
        aared_rule(MaddTag::Waw),
    ));
    rows.push(ruled(
        "ِي([^ اويًٌٍَُِّْٓ\u{06E5}\u{06E6}])(ْ?)$",
        &format!("ِ{}${{1}}${{2}}", beats('\u{06E6}', aared)),
        aared_rule(MaddTag::Yaa),
    ));
    rows.push(ruled(
        "َا([^ اويًٌٍَُِّْٓ\u{06E5}\u{06E6}])(ْ?)$",
        &format!("َ{}${{1}}${{2}}", beats('ا', aared)),
        aared_rule(MaddTag::Alif),
    ));
    rows.push(ruled(
        "ُو([^ اويًٌٍَُِّْٓ\u{06E5}\u{06E6}])(ْ?)$",
        &format!("ُ{}${{1}}${{2}}", beats('\u{06E5}', aared)),
        aared_rule(MaddTag::Waw),
    ));
    // Aared in front of a sakt stop mid-text (the Anfal/Tawba junction).
    rows.push(ruled(
        "ِيمْۜ",
        &format!("ِ{}مْۜ", beats('\u{06E6}', aared)),
        aared_rule(MaddTag::Yaa),
    ));
    // Leen: the diphthong stretches before the pausal consonant.
    rows.push(ruled(
        "َ([وي])ْ([^ ])$",
        &format!("َ{}${{2}}", "${1}".repeat(aared.saturating_sub(1).max(1) as usize)),
        TajweedRule::new(RuleKind::LeenMadd, aared as u16),
    ));

    // Natural two-beat madds.
    rows.push(ruled("َا([^آٰ])", "َاا${1}", normal(MaddTag::Alif)));
    rows.push(ruled("َا$", "َاا", normal(MaddTag::Alif)));
    rows.push(ruled(
        "ُو([^وءاويًٌٍَُِّْٰٓ\u{06E5}\u{06E6}])",
        "ُ\u{06E5}\u{06E5}${1}",
        normal(MaddTag::Waw),
    ));
    rows.push(ruled("ُو$", "ُ\u{06E5}\u{06E5}", normal(MaddTag::Waw)));
    rows.push(ruled(
        "ِي([^يءاويًٌٍَُِّْٰٓ\u{06E5}\u{06E6}])",
        "ِ\u{06E6}\u{06E6}${1}",
        normal(MaddTag::Yaa),
    ));
    rows.push(ruled("ِي$", "ِ\u{06E6}\u{06E6}", normal(MaddTag::Yaa)));

    // Any madda still standing has been consumed by context above.
    rows.push(row("\u{0653}", ""));

    rows
}

fn qalqla(_moshaf: &MoshafConfig) -> Vec<RowSpec> {
    let q = TajweedRule::qalqalah;
    vec![
        ruled("([قطبجد])ْ", "${1}ْڇ", q()),
        ruled("([قطبجد])$", "${1}ڇ", q()),
        ruled("([قطبجد])ّ$", "${1}ّڇ", q()),
        // The phonetic script spells sukun by absence.
        row("ْ", ""),
        // A text-initial shadda has no first letter to double.
        row("^(.)ّ", "${1}"),
        // The doubled lam of the name of Allah is already written twice.
        row("للّ", "لل"),
        row("(.)ّ", "${1}${1}"),
    ]
}

// ---------------------------------------------------------------------------
// Compilation and the pipeline.
// ---------------------------------------------------------------------------

fn compile(
    arabic_name: &'static str,
    ops_before: &'static [&'static str],
    specs: Vec<RowSpec>,
) -> Result<Operation> {
    let mut rewrites = Vec::with_capacity(specs.len());
    for (i, (pattern, replacement, rule)) in specs.into_iter().enumerate() {
        let pattern = Regex::new(&pattern).map_err(|source| PhoneticsError::BadPattern {
            operation: arabic_name,
            row: i,
            source,
        })?;
        rewrites.push(Rewrite {
            pattern,
            replacement,
            rule,
        });
    }
    Ok(Operation {
        arabic_name,
        rewrites,
        ops_before,
    })
}

/// The whole pipeline, compiled for one Moshaf configuration.
pub struct OperationSet {
    ops: Vec<Operation>,
}

impl OperationSet {
    pub fn new(moshaf: &MoshafConfig) -> Result<Self> {
        let ops = vec![
            compile(DISASSEMBLE_HROF_MOQATTA, &[], disassemble_hrof_moqatta(moshaf))?,
            compile(SPECIAL_CASES, &[], special_cases(moshaf))?,
            compile(BEGIN_WITH_HAMZAT_WASL, &[], begin_with_hamzat_wasl(moshaf))?,
            compile(CONVERT_ALIF_MAKSORA, &[], convert_alif_maksora(moshaf))?,
            compile(NORMALIZE_HMAZAT, &[], normalize_hmazat(moshaf))?,
            compile(
                ITHBAT_YAA_YOHIE,
                &[CONVERT_ALIF_MAKSORA],
                ithbat_yaa_yohie(moshaf),
            )?,
            compile(REMOVE_KASHEEDA, &[], remove_kasheeda(moshaf))?,
            compile(REMOVE_HMZAT_WASL_MIDDLE, &[], remove_hmzat_wasl_middle(moshaf))?,
            compile(REMOVE_SKOON_MOSTADEER, &[], remove_skoon_mostadeer(moshaf))?,
            compile(SKOON_MOSTATEEL, &[], skoon_mostateel(moshaf))?,
            compile(MADD_ALEWAD, &[], madd_alewad(moshaf))?,
            compile(WAW_ALSALAH, &[], waw_alsalah(moshaf))?,
            compile(ENLARGE_SMALL_LETTERS, &[REMOVE_KASHEEDA], enlarge_small_letters(moshaf))?,
            compile(CLEAN_END, &[ENLARGE_SMALL_LETTERS], clean_end(moshaf))?,
            compile(NORMALIZE_TAA, &[CLEAN_END], normalize_taa(moshaf))?,
            compile(ADD_ALIF_ISM_ALLAH, &[REMOVE_HMZAT_WASL_MIDDLE], add_alif_ism_allah(moshaf))?,
            compile(
                PREPARE_GHONNA_IDGHAM_IQLAB,
                &[NORMALIZE_TAA, MADD_ALEWAD],
                prepare_ghonna_idgham_iqlab(moshaf),
            )?,
            compile(
                ILTIQAA_ALSAKNAN,
                &[REMOVE_HMZAT_WASL_MIDDLE, PREPARE_GHONNA_IDGHAM_IQLAB],
                iltiqaa_alsaknan(moshaf),
            )?,
            compile(GHONNA, &[PREPARE_GHONNA_IDGHAM_IQLAB], ghonna(moshaf))?,
            compile(TASHEEL, &[NORMALIZE_HMAZAT], tasheel(moshaf))?,
            compile(IMALA, &[CONVERT_ALIF_MAKSORA], imala(moshaf))?,
            compile(
                MADD,
                &[
                    CONVERT_ALIF_MAKSORA,
                    NORMALIZE_HMAZAT,
                    ENLARGE_SMALL_LETTERS,
                    CLEAN_END,
                ],
                madd(moshaf),
            )?,
            compile(QALQLA, &[GHONNA, MADD], qalqla(moshaf))?,
        ];
        Ok(Self { ops })
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn get(&self, arabic_name: &str) -> Option<&Operation> {
        self.ops.iter().find(|op| op.arabic_name == arabic_name)
    }

    /// Apply one operation. In test mode, its declared dependencies run
    /// first, minus the discard set; each dependency resolves its own
    /// `ops_before` chain the same way.
    pub fn apply(
        &self,
        name: &str,
        text: &str,
        mappings: Option<MappingList>,
        mode: Mode,
        discard: &HashSet<&str>,
    ) -> Result<(String, MappingList)> {
        let op = self
            .get(name)
            .unwrap_or_else(|| panic!("unknown operation `{name}`"));
        let mut text = text.to_owned();
        let mut mappings = mappings;
        if mode == Mode::Test {
            for dep in op.ops_before {
                if discard.contains(dep) {
                    continue;
                }
                let (next, m) = self.apply(dep, &text, mappings, Mode::Test, discard)?;
                text = next;
                mappings = if m.is_empty() { None } else { Some(m) };
            }
        }
        op.forward(&text, mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apply(name: &str, text: &str, moshaf: &MoshafConfig) -> String {
        let set = OperationSet::new(moshaf).expect("compile");
        let (out, _) = set
            .apply(name, text, None, Mode::Inference, &HashSet::new())
            .expect("apply");
        out
    }

    fn hafs() -> MoshafConfig {
        MoshafConfig::default()
    }

    #[test]
    fn pipeline_compiles_for_every_variant_axis() {
        let mut moshaf = MoshafConfig::hafs(2, 5, 5, 6);
        moshaf.meem_aal_imran = MeemAalImran::Wasl6;
        moshaf.meem_mokhfah = MeemMokhfahChoice::Meem;
        moshaf.tasheel_or_madd = TasheelOrMadd::Tasheel;
        moshaf.sakt_iwaja = SaktChoice::Idraj;
        moshaf.between_anfal_and_tawba = AnfalTawbaChoice::Sakt;
        let set = OperationSet::new(&moshaf).expect("compile");
        assert_eq!(set.ops().len(), OPERATION_ORDER.len());
        for (op, name) in set.ops().iter().zip(OPERATION_ORDER) {
            assert_eq!(op.arabic_name, *name);
        }
    }

    #[test]
    fn disassemble_alif_lam_meem() {
        assert_eq!(apply(DISASSEMBLE_HROF_MOQATTA, "الٓمٓ", &hafs()), "أَلِفْ لَآم مِّيٓمْ");
        assert_eq!(
            apply(DISASSEMBLE_HROF_MOQATTA, "الٓمٓ ذَٰلِكَ ٱلْكِتَـٰبُ لَا", &hafs()),
            "أَلِفْ لَآم مِّيٓمْ ذَٰلِكَ ٱلْكِتَـٰبُ لَا"
        );
    }

    #[test]
    fn disassemble_leaves_plain_words_alone() {
        let aya = "وَهُمْ فِيهَا خَـٰلِدُونَ";
        assert_eq!(apply(DISASSEMBLE_HROF_MOQATTA, aya, &hafs()), aya);
        // `طه` must not fire inside a word.
        let aya = "مُّطَهَّرَةٌۭ";
        assert_eq!(apply(DISASSEMBLE_HROF_MOQATTA, aya, &hafs()), aya);
    }

    #[test]
    fn disassemble_hawamim() {
        assert_eq!(
            apply(DISASSEMBLE_HROF_MOQATTA, "حمٓ عٓسٓقٓ", &hafs()),
            "حَا مِيٓمْ عَيٓن سِيٓن قَآفْ"
        );
    }

    #[test]
    fn begin_with_hamzat_wasl_variants() {
        assert_eq!(
            apply(BEGIN_WITH_HAMZAT_WASL, "ٱلْحَمْدُ", &hafs()),
            "أَلْحَمْدُ"
        );
        assert_eq!(
            apply(BEGIN_WITH_HAMZAT_WASL, "ٱهْدِنَا", &hafs()),
            "إِهْدِنَا"
        );
        assert_eq!(
            apply(BEGIN_WITH_HAMZAT_WASL, "ٱمْشُوا۟", &hafs()),
            "أُمْشُوا۟"
        );
        assert_eq!(
            apply(BEGIN_WITH_HAMZAT_WASL, "لْيَقْضُوا۟", &hafs()),
            "لِيَقْضُوا۟"
        );
    }

    #[test]
    fn alif_maksora_conversions() {
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "هُدًۭى", &hafs()), "هُدًۭ");
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "بِٱلْهُدَىٰ", &hafs()), "بِٱلْهُدَا");
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "شَىْءٍۢ", &hafs()), "شَيْءٍۢ");
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "بِأَىِّ", &hafs()), "بِأَيِّ");
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "فِىٓ", &hafs()), "فِيٓ");
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "وَقُضِىَ", &hafs()), "وَقُضِيَ");
        assert_eq!(apply(CONVERT_ALIF_MAKSORA, "فِى", &hafs()), "فِي");
    }

    #[test]
    fn hamazat_normalize_to_the_bare_hamza() {
        assert_eq!(apply(NORMALIZE_HMAZAT, "إِبْرَٰهِـۧمَ", &hafs()), "ءِبْرَٰهِـۧمَ");
        assert_eq!(apply(NORMALIZE_HMAZAT, "يُؤْمِنُونَ", &hafs()), "يُءْمِنُونَ");
        assert_eq!(apply(NORMALIZE_HMAZAT, "ٱلْـَٔاخِرَةِ", &hafs()), "ٱلْـءَاخِرَةِ");
        // Precomposed madda alif decomposes.
        assert_eq!(apply(NORMALIZE_HMAZAT, "ءَ\u{0622}لْـَٔـٰنَ", &hafs()), "ءَا\u{0653}لْـءَـٰنَ");
    }

    #[test]
    fn yaa_yohie_is_sounded() {
        assert_eq!(
            apply(ITHBAT_YAA_YOHIE, "كَيْفَ تُحْيِ ٱلْمَوْتَىٰ", &hafs()),
            "كَيْفَ تُحْيِي ٱلْمَوْتَىٰ"
        );
        // The noun wahy keeps its single yaa.
        assert_eq!(
            apply(ITHBAT_YAA_YOHIE, "بِٱلْوَحْيِ وَلَا", &hafs()),
            "بِٱلْوَحْيِ وَلَا"
        );
    }

    #[test]
    fn wasl_mid_text_is_silent() {
        assert_eq!(
            apply(REMOVE_HMZAT_WASL_MIDDLE, "فِى ٱلْأَرْضِ وَمَكْرَ ٱلسَّيِّئِ", &hafs()),
            "فِى لْأَرْضِ وَمَكْرَ لسَّيِّئِ"
        );
    }

    #[test]
    fn rounded_zero_silences_its_letter() {
        assert_eq!(apply(REMOVE_SKOON_MOSTADEER, "وَجِا۟ىٓءَ", &hafs()), "وَجِىٓءَ");
        assert_eq!(apply(REMOVE_SKOON_MOSTADEER, "ٱمْشُوا۟ وَٱصْبِرُوا۟", &hafs()), "ٱمْشُو وَٱصْبِرُو");
    }

    #[test]
    fn rectangular_zero_reads_only_in_waqf() {
        assert_eq!(
            apply(SKOON_MOSTATEEL, "أَنَا۠ رَبُّكُمُ", &hafs()),
            "أَنَ رَبُّكُمُ"
        );
        assert_eq!(apply(SKOON_MOSTATEEL, "قَوَارِيرَا۠", &hafs()), "قَوَارِيرَا");
    }

    #[test]
    fn madd_alewad_cases() {
        assert_eq!(
            apply(MADD_ALEWAD, "عَذَابًۭا شَدِيدًۭا كَانَ", &hafs()),
            "عَذَابًۭ شَدِيدًۭ كَانَ"
        );
        assert_eq!(apply(MADD_ALEWAD, "مَآءًۭ", &hafs()), "مَآءَا");
        assert_eq!(apply(MADD_ALEWAD, "جَزَآءًۢ", &hafs()), "جَزَآءَا");
    }

    #[test]
    fn waw_alsalah_sounds_as_alif() {
        assert_eq!(apply(WAW_ALSALAH, "ٱلصَّلَوٰةَ", &hafs()), "ٱلصَّلَاةَ");
        assert_eq!(apply(WAW_ALSALAH, "ٱلزَّكَوٰةَ", &hafs()), "ٱلزَّكَاةَ");
        // waw with its own haraka is a consonant.
        assert_eq!(apply(WAW_ALSALAH, "ٱلصَّوَٰعِقِ", &hafs()), "ٱلصَّوَٰعِقِ");
    }

    #[test]
    fn small_letters_enlarge() {
        assert_eq!(apply(ENLARGE_SMALL_LETTERS, "ذَٰلِكَ", &hafs()), "ذَالِكَ");
        assert_eq!(apply(ENLARGE_SMALL_LETTERS, "لَهُۥ وَكِيلًۭا", &hafs()), "لَهُو وَكِيلًۭا");
        assert_eq!(apply(ENLARGE_SMALL_LETTERS, "نُـۨجِى", &hafs()), "نُنجِى");
        // Pausal silat haa drops.
        assert_eq!(apply(ENLARGE_SMALL_LETTERS, "مَالَهُۥٓ", &hafs()), "مَالَهُ");
        assert_eq!(apply(ENLARGE_SMALL_LETTERS, "فِيهِۦ", &hafs()), "فِيهِ");
    }

    #[test]
    fn clean_end_drops_the_final_haraka() {
        assert_eq!(apply(CLEAN_END, "لِّلْمُتَّقِينَ", &hafs()), "لِّلْمُتَّقِين");
        assert_eq!(apply(CLEAN_END, "شَكُورٌۭ", &hafs()), "شَكُور");
        assert_eq!(apply(CLEAN_END, "أَحَدٌۢ", &hafs()), "أَحَد");
        assert_eq!(apply(CLEAN_END, "وَمَآ", &hafs()), "وَمَا");
        assert_eq!(apply(CLEAN_END, "ٱلْغَنِىُّ", &hafs()), "ٱلْغَنِىّ");
    }

    #[test]
    fn taa_marbota_normalizes() {
        assert_eq!(
            apply(NORMALIZE_TAA, "مَقْطُوعَةٍۢ وَلَا مَمْنُوعَةٍۢ", &hafs()),
            "مَقْطُوعَتٍۢ وَلَا مَمْنُوعَتٍۢ"
        );
        assert_eq!(apply(NORMALIZE_TAA, "مَمْنُوعَة", &hafs()), "مَمْنُوعَه");
    }

    #[test]
    fn ism_allah_gains_its_alif() {
        assert_eq!(apply(ADD_ALIF_ISM_ALLAH, "بِللَّهِ مِنَ", &hafs()), "بِللَّاهِ مِنَ");
        assert_eq!(apply(ADD_ALIF_ISM_ALLAH, "لِلَّهِ رَبِّ", &hafs()), "لِلَّاهِ رَبِّ");
        assert_eq!(apply(ADD_ALIF_ISM_ALLAH, "للَّه", &hafs()), "للَّاه");
        // lahab and lahw only look like the name.
        assert_eq!(apply(ADD_ALIF_ISM_ALLAH, "مِنَ ٱللَّهَبِ", &hafs()), "مِنَ ٱللَّهَبِ");
        assert_eq!(apply(ADD_ALIF_ISM_ALLAH, "مِنَ ٱللَّهْوِ وَ", &hafs()), "مِنَ ٱللَّهْوِ وَ");
    }

    #[test]
    fn prepare_unfolds_tanween_and_silent_lam() {
        assert_eq!(
            apply(PREPARE_GHONNA_IDGHAM_IQLAB, "لَيْلَتًۭ ثُمَّ", &hafs()),
            "لَيْلَتَن ثُمَّ"
        );
        assert_eq!(apply(PREPARE_GHONNA_IDGHAM_IQLAB, "مِنۢ بَعْدِ", &hafs()), "مِم بَعْدِ");
        assert_eq!(
            apply(PREPARE_GHONNA_IDGHAM_IQLAB, "سَمِيعٌۢ بَصِيرٌ", &hafs()),
            "سَمِيعُم بَصِيرٌ"
        );
        assert_eq!(
            apply(PREPARE_GHONNA_IDGHAM_IQLAB, "أَقُل لَّكُمْ", &hafs()),
            "أَقُلَّكُمْ"
        );
        assert_eq!(
            apply(PREPARE_GHONNA_IDGHAM_IQLAB, "غَيْبَ لسَّمَـٰوَٰتِ", &hafs()),
            "غَيْبَ سَّمَـٰوَٰتِ"
        );
        assert_eq!(
            apply(PREPARE_GHONNA_IDGHAM_IQLAB, "رَبِحَت تِّجَـٰرَتُهُمْ", &hafs()),
            "رَبِحَتِّجَـٰرَتُهُمْ"
        );
    }

    #[test]
    fn ghonna_runs() {
        assert_eq!(apply(GHONNA, "فَمَن يَعْمَلْ", &hafs()), "فَمَيييَعْمَلْ");
        assert_eq!(apply(GHONNA, "مِنكُمْ", &hafs()), "مِںںںكُمْ");
        assert_eq!(apply(GHONNA, "مِن قَبْلِكَ", &hafs()), "مِںںںقَبْلِكَ");
        assert_eq!(apply(GHONNA, "إِنَّمَا", &hafs()), "إِننننَمَا");
        assert_eq!(apply(GHONNA, "وَلَن نُّشْرِكَ", &hafs()), "وَلَننننُشْرِكَ");
        assert_eq!(apply(GHONNA, "لَكُم مَّا", &hafs()), "لَكُممممَا");
        assert_eq!(apply(GHONNA, "مِن مَّالٍ", &hafs()), "مِممممَالٍ");
        assert_eq!(apply(GHONNA, "حَمَّالَةَ", &hafs()), "حَممممَالَةَ");
        assert_eq!(apply(GHONNA, "مِم بَعْدِ", &hafs()), "مِ۾۾۾بَعْدِ");
        // Word-initial shadda with nothing before it stays put.
        assert_eq!(apply(GHONNA, "مِّنْ خَوْفٍۭ", &hafs()), "مِّنْ خَوْفٍۭ");
    }

    #[test]
    fn ghonna_meem_choice() {
        let mut moshaf = hafs();
        moshaf.meem_mokhfah = MeemMokhfahChoice::Meem;
        assert_eq!(apply(GHONNA, "تَرْمِيهِم بِحِجَارَةٍۢ", &moshaf), "تَرْمِيهِمممبِحِجَارَةٍۢ");
        assert_eq!(apply(GHONNA, "تَرْمِيهِم بِحِجَارَةٍۢ", &hafs()), "تَرْمِيهِ۾۾۾بِحِجَارَةٍۢ");
    }

    #[test]
    fn iltiqaa_drops_the_madd_letter() {
        assert_eq!(
            apply(ILTIQAA_ALSAKNAN, "مُهْلِكُوهَا قَبْلَ", &hafs()),
            "مُهْلِكُوهَا قَبْلَ"
        );
        assert_eq!(apply(ILTIQAA_ALSAKNAN, "هْدِنَا صِّرَٰطَ", &hafs()), "هْدِنَ صِّرَٰطَ");
        assert_eq!(apply(ILTIQAA_ALSAKNAN, "فِى لْكِتَٰبِ", &hafs()), "فِ لْكِتَٰبِ");
    }

    #[test]
    fn tasheel_eases_the_second_hamza() {
        let mut moshaf = hafs();
        moshaf.tasheel_or_madd = TasheelOrMadd::Tasheel;
        assert_eq!(
            apply(TASHEEL, "ءَا\u{06EC}عْجَمِ", &moshaf),
            "ءَ\u{0672}عْجَمِ"
        );
        assert_eq!(
            apply(TASHEEL, "ءَا\u{0653}لذَّكَرَيْنِ", &moshaf),
            "ءَ\u{0672}لذَّكَرَيْنِ"
        );
    }

    #[test]
    fn madd_expands_by_configured_lengths() {
        // Natural madd (mid-text; a text-final run would take the aared
        // length instead).
        assert_eq!(apply(MADD, "قَالَ مِن", &hafs()), "قَاالَ مِن");
        // Aared at the end of the text.
        assert_eq!(apply(MADD, "رَّحِيم", &hafs()), "رَّحِ\u{06E6}\u{06E6}\u{06E6}\u{06E6}م");
        let mut short = hafs();
        short.madd_aared_len = 2;
        assert_eq!(apply(MADD, "رَّحِيم", &short), "رَّحِ\u{06E6}\u{06E6}م");
        // Mottasel with its hamza in the same word.
        assert_eq!(
            apply(MADD, "سَمَا\u{0653}ءِ", &hafs()),
            "سَمَااااءِ"
        );
        // Monfasel across the word boundary.
        assert_eq!(
            apply(MADD, "بِمَا\u{0653} ءُنزِلَ", &hafs()),
            "بِمَاااا ءُنزِلَ"
        );
        // Leen before the pausal consonant.
        assert_eq!(apply(MADD, "خَوْف", &hafs()), "خَوووف");
    }

    #[test]
    fn qalqla_marks_and_flattens() {
        assert_eq!(apply(QALQLA, "يَدْخُلُونَ", &hafs()), "يَدڇخُلُونَ");
        assert_eq!(apply(QALQLA, "رَيب", &hafs()), "رَيبڇ");
        assert_eq!(apply(QALQLA, "بِسْمِ", &hafs()), "بِسمِ");
        // Text-initial shadda has nothing before it to double.
        assert_eq!(apply(QALQLA, "رَّحْمَـٰنِ", &hafs()), "رَحمَـٰنِ");
        // Word-initial shadda mid-text doubles its letter.
        assert_eq!(apply(QALQLA, "بِ رَّحِيم", &hafs()), "بِ ررَحِيم");
        assert_eq!(apply(QALQLA, "للَّاهِ", &hafs()), "للَاهِ");
    }

    #[test]
    fn test_mode_resolves_dependencies_recursively() {
        // Exercising one op on raw Uthmani text must pull in its whole
        // dependency closure: QALQLA needs MADD, and MADD in turn needs
        // CLEAN_END (and its chain) to expose the pausal aared madd.
        let set = OperationSet::new(&hafs()).expect("compile");
        let input = "\u{0639}\u{064E}\u{0630}\u{064E}\u{0627}\u{0628}\u{0650}"; // عذابِ
        let (out, _) = set
            .apply(QALQLA, input, None, Mode::Test, &HashSet::new())
            .expect("apply");
        // CLEAN_END drops the final kasra, MADD stretches the aared madd to
        // four beats, QALQLA bounces the pausal baa. A single-level
        // resolution would leave the kasra in place.
        assert_eq!(
            out,
            "\u{0639}\u{064E}\u{0630}\u{064E}\u{0627}\u{0627}\u{0627}\u{0627}\u{0628}\u{0687}"
        );

        // Discarded dependencies are skipped at every level of the chain.
        let discard: HashSet<&str> = [MADD].into_iter().collect();
        let (out, _) = set
            .apply(QALQLA, input, None, Mode::Test, &discard)
            .expect("apply");
        assert_eq!(out, "\u{0639}\u{064E}\u{0630}\u{064E}\u{0627}\u{0628}\u{0687}");
    }
}
