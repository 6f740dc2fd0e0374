use std::path::PathBuf;

use clap::{Parser, Subcommand};

use voice_cli::commands::compose_ops::{self, ComposeArgs};
use voice_cli::commands::simulate_ops::{self, SimulateArgs};
use voice_cli::commands::{config_ops, history_ops, load_settings, parse_language};
use voice_cli::trace_init::init_tracing;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "voicetool", about = "Suggestion engine tools for the VOICE keyboard")]
struct Cli {
    /// Custom settings TOML (default: embedded settings)
    #[arg(long, global = true)]
    settings: Option<String>,
    /// Write JSON traces to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay target sentences and measure how much suggestions save
    Simulate {
        /// File with one target sentence per line (default: stdin)
        input: Option<String>,
        /// Language code (en, ja, zh)
        #[arg(long, default_value = "en")]
        lang: String,
        /// Suggestion backend root URL
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        /// Use only the local sentence history, no backend
        #[arg(long)]
        offline: bool,
        /// Sentence history file to seed from and update
        #[arg(long)]
        history: Option<String>,
        /// Sentence suggestions considered per step
        #[arg(long, default_value = "2")]
        sentences: usize,
        /// Output JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compose interactively: stdin lines are typed, `:cmd` lines edit
    Compose {
        /// Language code (en, ja, zh)
        #[arg(long, default_value = "en")]
        lang: String,
        /// Suggestion backend root URL
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        /// Use only the local sentence history, no backend
        #[arg(long)]
        offline: bool,
        /// Sentence history file to load and save
        #[arg(long)]
        history: Option<String>,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Inspect a sentence history file
    History {
        /// Sentence history file
        file: String,
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print all entries, oldest first
    Dump {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the reuse candidate for a text
    Search {
        /// Text typed so far
        text: String,
    },
    /// Remove all entries
    Clear,
}

fn main() {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());
    let settings = load_settings(cli.settings.as_deref());

    match cli.command {
        Command::Simulate {
            input,
            lang,
            endpoint,
            offline,
            history,
            sentences,
            json,
        } => simulate_ops::simulate(
            &SimulateArgs {
                input: input.as_deref(),
                language: parse_language(&lang),
                endpoint: &endpoint,
                offline,
                history: history.as_deref(),
                sentences,
                json,
            },
            settings,
        ),
        Command::Compose {
            lang,
            endpoint,
            offline,
            history,
        } => compose_ops::compose(
            &ComposeArgs {
                language: parse_language(&lang),
                endpoint: &endpoint,
                offline,
                history: history.as_deref(),
            },
            settings,
        ),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
        Command::History { file, action } => match action {
            HistoryAction::Dump { json } => history_ops::dump(&file, &settings, json),
            HistoryAction::Search { text } => history_ops::search(&file, &settings, &text),
            HistoryAction::Clear => history_ops::clear(&file, &settings),
        },
    }
}
