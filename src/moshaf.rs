//! Moshaf attribute configuration.
//!
//! A moshaf is a published edition of the Qur'an together with its recitation
//! conventions. Every option here selects a variant pattern inside one of the
//! rewrite operations; none of them change the mapping engine itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rewaya {
    #[default]
    Hafs,
}

/// Sakt (breathless pause) versus idraj (reading straight through).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaktChoice {
    #[default]
    Sakt,
    Idraj,
}

/// Junction between surat Al-Anfal and At-Tawba.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnfalTawbaChoice {
    #[default]
    Wasl,
    Sakt,
    Waqf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdghamChoice {
    #[default]
    Izhar,
    Idgham,
}

/// Words written with saad but optionally read with seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeenOrSaad {
    #[default]
    Seen,
    Saad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TasheelOrMadd {
    #[default]
    Madd,
    Tasheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IshmamOrRawm {
    #[default]
    Ishmam,
    Rawm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FathOrDam {
    #[default]
    Fath,
    Dam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HadhfOrIthbat {
    #[default]
    Hadhf,
    Ithbat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TafkheemOrTarqeeq {
    #[default]
    Tafkheem,
    Tarqeeq,
}

/// The disjoined meem opening Aal-Imran when read in wasl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeemAalImran {
    #[default]
    Waqf,
    Wasl2,
    Wasl6,
}

/// How the hidden meem of iqlab/ikhfa shafawi is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeemMokhfahChoice {
    #[default]
    Ikhfa,
    Meem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoshafConfig {
    pub rewaya: Rewaya,

    /// Elongation beats; every madd length is clamped-checked to 2..=6.
    pub madd_monfasel_len: u8,
    pub madd_mottasel_len: u8,
    pub madd_mottasel_waqf: u8,
    pub madd_aared_len: u8,
    /// Madd of the yaa in the disjoined ayn (2, 4 or 6).
    pub madd_yaa_alayn_alharfy: u8,

    pub sakt_iwaja: SaktChoice,
    pub sakt_marqdena: SaktChoice,
    pub sakt_man_raq: SaktChoice,
    pub sakt_bal_ran: SaktChoice,
    pub sakt_maleeyah: SaktChoice,
    pub between_anfal_and_tawba: AnfalTawbaChoice,

    pub noon_and_yaseen: IdghamChoice,
    pub yalhath_dhalik: IdghamChoice,
    pub irkab_maana: IdghamChoice,
    pub idgham_nakhluqkum: IdghamChoice,

    pub yaa_ataan: HadhfOrIthbat,
    pub alif_salasila: HadhfOrIthbat,

    /// Starting recitation at "the name": keep the wasl hamza or start at
    /// the lam.
    pub start_with_ism: HadhfOrIthbat,
    pub yabsut: SeenOrSaad,
    pub bastah: SeenOrSaad,
    pub almusaytirun: SeenOrSaad,
    pub bimusaytir: SeenOrSaad,

    pub tasheel_or_madd: TasheelOrMadd,
    pub noon_tamnna: IshmamOrRawm,
    pub harakat_daaf: FathOrDam,

    pub raa_firq: TafkheemOrTarqeeq,
    pub raa_alqitr: TafkheemOrTarqeeq,
    pub raa_misr: TafkheemOrTarqeeq,
    pub raa_nudhur: TafkheemOrTarqeeq,
    pub raa_yasr: TafkheemOrTarqeeq,

    pub meem_aal_imran: MeemAalImran,
    pub meem_mokhfah: MeemMokhfahChoice,
}

impl Default for MoshafConfig {
    fn default() -> Self {
        Self {
            rewaya: Rewaya::Hafs,
            madd_monfasel_len: 4,
            madd_mottasel_len: 4,
            madd_mottasel_waqf: 4,
            madd_aared_len: 4,
            madd_yaa_alayn_alharfy: 6,
            sakt_iwaja: SaktChoice::default(),
            sakt_marqdena: SaktChoice::default(),
            sakt_man_raq: SaktChoice::default(),
            sakt_bal_ran: SaktChoice::default(),
            sakt_maleeyah: SaktChoice::default(),
            between_anfal_and_tawba: AnfalTawbaChoice::default(),
            noon_and_yaseen: IdghamChoice::default(),
            yalhath_dhalik: IdghamChoice::Idgham,
            irkab_maana: IdghamChoice::Idgham,
            idgham_nakhluqkum: IdghamChoice::Idgham,
            yaa_ataan: HadhfOrIthbat::default(),
            alif_salasila: HadhfOrIthbat::default(),
            start_with_ism: HadhfOrIthbat::Ithbat,
            yabsut: SeenOrSaad::default(),
            bastah: SeenOrSaad::default(),
            almusaytirun: SeenOrSaad::default(),
            bimusaytir: SeenOrSaad::default(),
            tasheel_or_madd: TasheelOrMadd::default(),
            noon_tamnna: IshmamOrRawm::default(),
            harakat_daaf: FathOrDam::default(),
            raa_firq: TafkheemOrTarqeeq::default(),
            raa_alqitr: TafkheemOrTarqeeq::default(),
            raa_misr: TafkheemOrTarqeeq::default(),
            raa_nudhur: TafkheemOrTarqeeq::default(),
            raa_yasr: TafkheemOrTarqeeq::default(),
            meem_aal_imran: MeemAalImran::default(),
            meem_mokhfah: MeemMokhfahChoice::default(),
        }
    }
}

impl MoshafConfig {
    /// Hafs defaults with explicit madd lengths.
    pub fn hafs(monfasel: u8, mottasel: u8, mottasel_waqf: u8, aared: u8) -> Self {
        Self {
            madd_monfasel_len: monfasel,
            madd_mottasel_len: mottasel,
            madd_mottasel_waqf: mottasel_waqf,
            madd_aared_len: aared,
            ..Self::default()
        }
    }

    /// True when every madd length sits in the legal 2..=6 band.
    pub fn is_valid(&self) -> bool {
        [
            self.madd_monfasel_len,
            self.madd_mottasel_len,
            self.madd_mottasel_waqf,
            self.madd_aared_len,
            self.madd_yaa_alayn_alharfy,
        ]
        .iter()
        .all(|len| (2..=6).contains(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_hafs() {
        let moshaf = MoshafConfig::default();
        assert_eq!(moshaf.rewaya, Rewaya::Hafs);
        assert!(moshaf.is_valid());
    }

    #[test]
    fn out_of_band_madd_is_rejected() {
        let mut moshaf = MoshafConfig::default();
        moshaf.madd_monfasel_len = 9;
        assert!(!moshaf.is_valid());
    }

    #[test]
    fn json_round_trip() {
        let moshaf = MoshafConfig::hafs(2, 5, 5, 6);
        let text = serde_json::to_string(&moshaf).expect("serialize");
        let back: MoshafConfig = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(moshaf, back);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let moshaf: MoshafConfig =
            serde_json::from_str(r#"{"madd_monfasel_len": 2, "meem_mokhfah": "meem"}"#)
                .expect("deserialize");
        assert_eq!(moshaf.madd_monfasel_len, 2);
        assert_eq!(moshaf.meem_mokhfah, MeemMokhfahChoice::Meem);
        assert_eq!(moshaf.madd_mottasel_len, 4);
    }
}
