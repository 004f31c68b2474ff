use audiopick_core::{Identifier, ResolveMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Play pronunciation audio from the local audio server and add it to Anki cards
#[derive(Parser, Debug)]
#[command(name = "audiopick")]
#[command(version)]
#[command(after_help = "At the prompt: <n> plays source n, a or a<n> adds source n \
(default 0) to the card and exits, e exits, an empty line lists the sources again.")]
pub struct Args {
    /// Config file to use instead of ~/.config/audiopick/config.toml
    #[arg(long, global = true, env = "AUDIOPICK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Find a unique card by its word and look up audio for its reading
    Anki {
        word: String,
        /// Search the key field instead of the word field
        #[arg(long)]
        key: bool,
        /// Look up this word and reading instead of the card's own
        #[arg(long, num_args = 2, value_names = ["WORD", "READING"])]
        db_search: Option<Vec<String>>,
    },
    /// Use the card currently shown in the reviewer
    Current {
        /// Look up this word and reading instead of the card's own
        #[arg(long, num_args = 2, value_names = ["WORD", "READING"])]
        db_search: Option<Vec<String>>,
    },
    /// Look up a word directly; audio can be played but not added to a card
    Local {
        word: String,
        #[arg(long)]
        reading: Option<String>,
    },
}

impl Mode {
    #[must_use]
    pub fn resolve_mode(&self) -> ResolveMode {
        match self {
            Self::Anki { word, key, .. } => ResolveMode::ByQuery {
                word: word.clone(),
                search_key: *key,
            },
            Self::Current { .. } => ResolveMode::ByContext,
            Self::Local { word, reading } => {
                ResolveMode::Direct(Identifier::new(word).with_optional_reading(reading.clone()))
            }
        }
    }

    /// Word and reading given with `--db-search`, if any.
    #[must_use]
    pub fn lookup_override(&self) -> Option<Identifier> {
        match self {
            Self::Anki { db_search, .. } | Self::Current { db_search } => {
                match db_search.as_deref() {
                    Some([word, reading]) => Some(Identifier::new(word).with_reading(reading)),
                    _ => None,
                }
            }
            Self::Local { .. } => None,
        }
    }
}
