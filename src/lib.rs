//! Uthmani-to-phonetic transcription with character-level mappings.
//!
//! The crate converts Qur'anic Uthmani orthography into a phonetic script
//! through a fixed pipeline of regex rewrite operations. Every rewrite runs
//! through a mapping-preserving substitution primitive, so the final phoneme
//! stream still knows, per codepoint of the original text, where it came
//! from and which tajweed rules touched it. On top of the pipeline sit a
//! precomputed phoneme index with fuzzy substring search and a reciter-error
//! explainer.
//!
//! # Example
//!
//! ```
//! use quran_phonetics::moshaf::MoshafConfig;
//! use quran_phonetics::phonetizer::phonetize;
//!
//! let moshaf = MoshafConfig::default();
//! let out = phonetize("لَكُم مَّا", &moshaf, false).unwrap();
//! assert_eq!(out.phonemes, "لَكُممممَاا");
//! // One mapping span per input codepoint; the space is gone from the
//! // phonemes but keeps its position as a deleted span.
//! assert_eq!(out.mapping.len(), 10);
//! assert!(out.mapping[5].deleted);
//! ```

pub mod alphabet;
pub mod error;
pub mod explain;
pub mod index;
pub mod levenshtein;
pub mod mapping;
pub mod moshaf;
pub mod operations;
pub mod phonetizer;
pub mod quran;
pub mod rules;
pub mod search;
pub mod sifa;

pub use error::{PhoneticsError, Result};
pub use mapping::{sub_with_mapping, MappingList, MappingSpan};
pub use moshaf::MoshafConfig;
pub use phonetizer::{phonetize, PhoneticOutput, Phonetizer};
pub use rules::TajweedRule;
pub use search::{PhonemeMatch, PhoneticSearch};
