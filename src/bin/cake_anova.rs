//! Group x task ANOVA on source accuracy with the Source / Item memory bar figure.
//!
//! Usage: cake_anova [CSV] [SETTINGS.json]

use anyhow::{Context, Result};
use cake_analysis::analysis;
use cake_analysis::settings::AnalysisSettings;
use env_logger::Env;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = AnalysisSettings::from_args(std::env::args().skip(1))?;
    let report = analysis::run_anova(&settings)
        .with_context(|| format!("ANOVA analysis of {}", settings.csv_path.display()))?;

    println!("{}", report);
    Ok(())
}
