use std::fs;
use std::process;

use voice_core::language::LanguageId;
use voice_core::settings::{parse_settings_toml, Settings};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub mod compose_ops;
pub mod config_ops;
pub mod history_ops;
pub mod simulate_ops;

/// Settings from `file`, or the embedded defaults.
pub fn load_settings(file: Option<&str>) -> Settings {
    let Some(file) = file else {
        return Settings::default();
    };
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(parse_settings_toml(&content), "Error in {file}: {}")
}

pub fn parse_language(code: &str) -> LanguageId {
    LanguageId::from_code(code).unwrap_or_else(|| {
        eprintln!("Error: unknown language '{code}' (available: en, ja, zh)");
        process::exit(1);
    })
}

fn runtime() -> tokio::runtime::Runtime {
    die!(
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build(),
        "Error starting runtime: {}"
    )
}
