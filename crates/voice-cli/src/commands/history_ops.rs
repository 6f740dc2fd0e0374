use std::path::Path;
use std::process;

use voice_core::message_history::MessageHistory;
use voice_core::settings::Settings;

fn open(file: &str, settings: &Settings) -> MessageHistory {
    die!(
        MessageHistory::open(Path::new(file), settings.history_limits()),
        "Error reading {file}: {}"
    )
}

pub fn dump(file: &str, settings: &Settings, json: bool) {
    let history = open(file, settings);
    if json {
        let out = die!(
            serde_json::to_string_pretty(history.entries()),
            "Error encoding JSON: {}"
        );
        println!("{out}");
        return;
    }
    for e in history.entries() {
        println!("{}\t{}\t{}", e.timestamp, e.user_prefix, e.sentence);
    }
    eprintln!("{} entries", history.len());
}

pub fn search(file: &str, settings: &Settings, text: &str) {
    let history = open(file, settings);
    match history.search(text) {
        Some(found) => println!("{found}"),
        None => {
            eprintln!("No match for {text:?}");
            process::exit(1);
        }
    }
}

pub fn clear(file: &str, settings: &Settings) {
    let mut history = open(file, settings);
    let removed = history.len();
    history.clear();
    die!(history.save(Path::new(file)), "Error writing {file}: {}");
    eprintln!("Removed {removed} entries from {file}");
}
