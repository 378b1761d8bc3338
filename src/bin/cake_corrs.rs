//! CAKe score correlations with the four accuracy measures, overall and by sex.
//!
//! Usage: cake_corrs [CSV] [SETTINGS.json]

use anyhow::{Context, Result};
use cake_analysis::analysis;
use cake_analysis::settings::AnalysisSettings;
use env_logger::Env;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = AnalysisSettings::from_args(std::env::args().skip(1))?;
    let report = analysis::run_correlations(&settings)
        .with_context(|| format!("Correlation analysis of {}", settings.csv_path.display()))?;

    println!("{}", report);
    for figure in &report.figures {
        println!("Figure: {}", figure.display());
    }
    Ok(())
}
