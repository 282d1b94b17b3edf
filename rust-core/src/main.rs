//! CLI: stdin JSON -> stdout JSON.
//!
//! Usage:
//!   echo '{"candidate":{...}, "history":[...]}' | claritycare-anomaly classify
//!   echo '{"entries":[...], "entry":{...}}' | claritycare-anomaly submit
//!   echo '{"procedure":"Knee Replacement", "bucket":"south"}' | claritycare-anomaly market
//!   echo '{"filter":"flagged"}' | claritycare-anomaly history
//!   echo '{}' | claritycare-anomaly stats
//!   echo '{"location":"Tamil Nadu"}' | claritycare-anomaly region
//!
//! Omitting `entries` uses the demo ledger.
use claritycare_core::logging::init_logging;
use claritycare_core::{cli, EngineConfig, PriceAnalyzer};
use std::{env, io};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("classify");
    let analyzer = PriceAnalyzer::new(EngineConfig::from_env()?);

    cli::run(cmd, &analyzer, io::stdin(), io::stdout())?;
    Ok(())
}
