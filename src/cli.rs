use crate::language::Language;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "live-code-collab")]
#[command(version)]
#[command(about = "Collaborative coding-interview sessions in the terminal")]
pub struct Args {
    /// TOML configuration file (latency, executor, editor settings)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List supported languages
    Languages,

    /// Print a language's starter template
    Template {
        #[arg(value_enum)]
        language: Language,
    },

    /// Execute a source file and print the result
    Run {
        /// Source file to execute
        file: PathBuf,

        /// Language of the file (guessed from the extension when omitted)
        #[arg(long, short, value_enum)]
        language: Option<Language>,
    },

    /// Play a scripted interview and print every session notification
    Demo {
        /// Language the demo session starts in
        #[arg(long, value_enum, default_value = "javascript")]
        language: Language,
    },

    /// Host an interactive interview room on stdin/stdout
    Room {
        /// Session title
        #[arg(long, default_value = crate::forms::DEFAULT_SESSION_TITLE)]
        title: String,

        /// Starting language
        #[arg(long, value_enum, default_value = "javascript")]
        language: Language,

        /// Host display name
        #[arg(long)]
        host: String,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Log filter directive for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Resolve the language for `run`: explicit flag, else the file extension.
pub fn resolve_language(file: &std::path::Path, explicit: Option<Language>) -> Option<Language> {
    explicit.or_else(|| {
        file.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
    })
}
