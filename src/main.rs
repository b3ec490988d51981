//! Command-line front end: build the phoneme index, search it, or phonetize
//! a piece of text directly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use quran_phonetics::index::build_index;
use quran_phonetics::moshaf::MoshafConfig;
use quran_phonetics::phonetizer::Phonetizer;
use quran_phonetics::quran::QuranCorpus;
use quran_phonetics::search::PhoneticSearch;

#[derive(Parser)]
#[command(name = "quran-phonetics", version, about = "Uthmani-to-phonetic transcription and phoneme search")]
struct Cli {
    /// Moshaf configuration as JSON; missing fields take Hafs defaults.
    #[arg(long, global = true)]
    moshaf: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the phoneme index over a corpus file.
    BuildIndex {
        /// Corpus JSON: an array of {"sura", "aya", "uthmani"} records.
        #[arg(long)]
        quran: PathBuf,
        /// Output directory for ph_index.npy and ref_norm_ph.txt.
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
    /// Fuzzy-search a phonetic query against a built index.
    Search {
        query: String,
        #[arg(long, default_value_t = 0.1)]
        error_ratio: f32,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Corpus JSON, used to print the matched Uthmani text.
        #[arg(long)]
        quran: Option<PathBuf>,
    },
    /// Phonetize a piece of Uthmani text and print the result.
    Phonetize {
        text: String,
        #[arg(long)]
        remove_spaces: bool,
    },
}

fn moshaf_from(arg: &Option<String>) -> Result<MoshafConfig> {
    let moshaf = match arg {
        Some(json) => serde_json::from_str(json).context("bad --moshaf json")?,
        None => MoshafConfig::default(),
    };
    anyhow::ensure!(
        MoshafConfig::is_valid(&moshaf),
        "madd lengths must be within 2..=6"
    );
    Ok(moshaf)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let moshaf = moshaf_from(&cli.moshaf)?;

    match cli.command {
        Command::BuildIndex { quran, out } => {
            let corpus = QuranCorpus::from_json_file(&quran)
                .with_context(|| format!("loading corpus {}", quran.display()))?;
            info!("corpus loaded: {} ayat", corpus.len());
            let phonetizer = Phonetizer::new(moshaf)?;
            let index = build_index(&corpus, &phonetizer)?;
            index.save(&out)?;
            println!(
                "indexed {} phoneme groups into {}",
                index.rows.len(),
                out.display()
            );
        }

        Command::Search {
            query,
            error_ratio,
            data_dir,
            quran,
        } => {
            let search = PhoneticSearch::load(&data_dir)
                .with_context(|| format!("loading index from {}", data_dir.display()))?;
            let corpus = quran
                .map(|path| QuranCorpus::from_json_file(&path))
                .transpose()?;
            let matches = search.search(&query, error_ratio)?;
            println!("{} match(es)", matches.len());
            for m in &matches {
                print!(
                    "{}:{} word {} (edits {})",
                    m.start.sura_idx, m.start.aya_idx, m.start.uthmani_word_idx, m.dist
                );
                if let Some(corpus) = &corpus {
                    match search.uthmani_text(corpus, m) {
                        Ok(text) => print!("  {text}"),
                        Err(e) => print!("  <{e}>"),
                    }
                }
                println!();
            }
        }

        Command::Phonetize {
            text,
            remove_spaces,
        } => {
            let phonetizer = Phonetizer::new(moshaf)?;
            let out = phonetizer.phonetize(&text, remove_spaces)?;
            println!("{}", out.phonemes);
        }
    }
    Ok(())
}
