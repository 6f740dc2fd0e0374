use std::fs;
use std::process;

pub fn settings_export() {
    print!("{}", voice_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        voice_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    let model = die!(s.model_id(None), "Error: {}");
    println!(
        "OK: ai.default_config={} ({model}), scheduler.debounce_step_ms={}, languages={}",
        s.ai.default_config,
        s.scheduler.debounce_step_ms,
        s.languages.keys().cloned().collect::<Vec<_>>().join(",")
    );
}
