use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::process;

use serde::Serialize;

use voice_core::client::SuggestionClient;
use voice_core::language::LanguageId;
use voice_core::message_history::MessageHistory;
use voice_core::settings::Settings;
use voice_session::SessionContext;

use crate::http::HttpSuggestionClient;
use crate::simulator::{OfflineClient, SimulationStats, Simulator};

pub struct SimulateArgs<'a> {
    /// File with one target sentence per line; stdin when absent.
    pub input: Option<&'a str>,
    pub language: LanguageId,
    pub endpoint: &'a str,
    pub offline: bool,
    pub history: Option<&'a str>,
    pub sentences: usize,
    pub json: bool,
}

#[derive(Serialize)]
struct TargetRecord<'a> {
    target: &'a str,
    #[serde(flatten)]
    stats: SimulationStats,
}

#[derive(Serialize)]
struct Summary {
    #[serde(flatten)]
    totals: SimulationStats,
    clicks: usize,
    selections: usize,
    chars_per_click: f64,
    chars_per_selection: f64,
    suggestion_select_rate: f64,
}

impl Summary {
    fn new(totals: SimulationStats) -> Self {
        Self {
            totals,
            clicks: totals.clicks(),
            selections: totals.selections(),
            chars_per_click: totals.chars_per_click(),
            chars_per_selection: totals.chars_per_selection(),
            suggestion_select_rate: totals.suggestion_select_rate(),
        }
    }
}

fn read_targets(input: Option<&str>) -> Vec<String> {
    let lines: Vec<String> = match input {
        Some(file) => {
            let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
            content.lines().map(str::to_string).collect()
        }
        None => die!(
            io::stdin().lock().lines().collect::<Result<Vec<_>, _>>(),
            "Error reading stdin: {}"
        ),
    };
    lines.into_iter().filter(|l| !l.trim().is_empty()).collect()
}

fn print_stats(stats: &SimulationStats) {
    println!(
        "input_len: {} initial_phrase_count: {} char_count: {} word_count: {} word_len: {} sentence_count: {} sentence_len: {}",
        stats.input_len,
        stats.initial_phrase_count,
        stats.char_count,
        stats.word_count,
        stats.word_len,
        stats.sentence_count,
        stats.sentence_len
    );
}

fn print_json<T: Serialize>(value: &T) {
    let line = die!(serde_json::to_string(value), "Error encoding JSON: {}");
    println!("{line}");
}

pub fn simulate(args: &SimulateArgs, settings: Settings) {
    let targets = read_targets(args.input);
    let limits = settings.history_limits();
    let mut session = die!(SessionContext::new(settings, args.language), "Error: {}");
    if let Some(file) = args.history {
        let history = die!(
            MessageHistory::open(Path::new(file), limits),
            "Error reading {file}: {}"
        );
        session = session.with_message_history(history);
    }

    let http;
    let client: &dyn SuggestionClient = if args.offline {
        &OfflineClient
    } else {
        http = HttpSuggestionClient::new(args.endpoint);
        &http
    };

    let mut sim = Simulator::new(session, client).with_sentence_limit(args.sentences);
    let mut totals = SimulationStats::default();
    let mut failed = 0usize;

    super::runtime().block_on(async {
        for target in &targets {
            if !args.json {
                println!("target: {target}");
            }
            match sim.simulate(target).await {
                Ok(stats) => {
                    totals += stats;
                    if args.json {
                        print_json(&TargetRecord {
                            target,
                            stats,
                        });
                    } else {
                        print_stats(&stats);
                    }
                }
                Err(e) => {
                    failed += 1;
                    eprintln!("Skipping {target:?}: {e}");
                }
            }
        }
    });

    let summary = Summary::new(totals);
    if args.json {
        print_json(&summary);
    } else {
        println!("total:");
        print_stats(&summary.totals);
        println!("total clicks: {}", summary.clicks);
        println!("average chars per click: {:.3}", summary.chars_per_click);
        println!("suggestion select rate: {:.3}", summary.suggestion_select_rate);
        println!("total selections: {}", summary.selections);
        println!("average chars per selection: {:.3}", summary.chars_per_selection);
    }
    tracing::info!(
        targets = targets.len(),
        failed,
        entered = sim.entered(),
        "simulation finished"
    );

    if let Some(file) = args.history {
        let session = sim.into_session();
        die!(
            session.message_history().save(Path::new(file)),
            "Error writing {file}: {}"
        );
    }
}
