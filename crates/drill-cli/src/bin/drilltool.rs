use std::path::PathBuf;

use clap::{Parser, Subcommand};

use drill_cli::commands::replay_ops::ReplayOptions;
use drill_cli::commands::{config_ops, replay_ops, segment_ops};

#[derive(Parser)]
#[command(name = "drilltool", about = "Romaji typing-drill diagnostics")]
struct Cli {
    /// Write JSON-lines traces to this directory (needs the `trace` feature)
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split kana into drill units and list their spellings
    Segment {
        /// Kana sentence (katakana and full-width symbols are normalized)
        kana: String,
        /// Output the sentence run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every spelling of one kana unit, preferred first
    Patterns {
        /// Kana unit (1-3 characters)
        kana: String,
    },
    /// Export the default pattern seed table as TOML
    PatternsExport,
    /// Validate a pattern seed TOML file
    PatternsValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Export the default settings as TOML
    SettingsExport,
    /// Validate a settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Run a whole drill over a batch with a synthetic clock
    Replay {
        /// JSON array of {id, kana, text}
        batch_file: String,
        /// Key names to replay, one per line ("Space", "Escape", or a character)
        #[arg(long, conflicts_with = "auto")]
        keys: Option<String>,
        /// Type each sentence's displayed romaji without mistakes (default)
        #[arg(long)]
        auto: bool,
        /// Milliseconds between keystrokes
        #[arg(long, default_value = "150")]
        ms_per_key: u64,
        /// Settings TOML to use instead of the defaults
        #[arg(long)]
        settings: Option<String>,
        /// Sentence pool JSON; plans the batch with the fill policy first
        #[arg(long)]
        pool: Option<String>,
        /// Seed for batch planning
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Some(dir) = &cli.trace_dir {
        drill_engine::init_tracing(dir);
    }

    match cli.command {
        Command::Segment { kana, json } => segment_ops::segment_cmd(&kana, json),
        Command::Patterns { kana } => segment_ops::patterns_cmd(&kana),
        Command::PatternsExport => config_ops::patterns_export(),
        Command::PatternsValidate { file } => config_ops::patterns_validate(&file),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
        Command::Replay {
            batch_file,
            keys,
            auto: _,
            ms_per_key,
            settings,
            pool,
            seed,
        } => {
            let opts = ReplayOptions {
                keys: keys.as_deref(),
                ms_per_key,
                settings: settings.as_deref(),
                pool: pool.as_deref(),
                seed,
            };
            replay_ops::replay(&batch_file, &opts);
        }
    }
}
