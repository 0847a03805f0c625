use std::process::ExitCode;

use aqmon::analysis::summary;
use aqmon::classify::AqiCategory;
use aqmon::logging;
use aqmon::{AppConfig, AqmonError, RunReport};

const PREVIEW_STATIONS: usize = 5;

fn main() -> ExitCode {
    println!("=== MOENV air quality snapshot ===");

    // Config comes first so its errors are reported before anything else runs.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => return fail(&AqmonError::from(e)),
    };

    logging::init_logger(&config.log_level, config.log_file.as_deref(), false);

    match aqmon::run(&config).and_then(RunReport::into_result) {
        Ok(report) => {
            print_report(&report);
            println!("\nOpen the HTML file in {} to view the map.", config.output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(err: &AqmonError) -> ExitCode {
    eprintln!("\nError: {}", err);
    eprintln!("{}", err.user_hint());
    ExitCode::from(err.exit_code())
}

fn print_report(report: &RunReport) {
    let s = &report.summary;

    println!("\nProcessed {} of {} station records ({} skipped)",
        report.readings.len(), report.fetched, report.skipped.len());

    println!("\n=== AQI statistics ===");
    if let (Some(min), Some(max), Some(mean)) = (s.min_aqi, s.max_aqi, s.mean_aqi) {
        println!("Stations with valid AQI: {}", s.valid_aqi);
        println!("AQI range: {} ~ {}", min, max);
        println!("Mean AQI: {:.1}", mean);
    } else {
        println!("No station reported a valid AQI");
    }
    for category in AqiCategory::ALL {
        let count = s.count(category);
        if count > 0 {
            println!("  {:<32} {:>4}", category.label(), count);
        }
    }

    println!("\nFirst {} stations:", PREVIEW_STATIONS);
    for line in summary::preview(&report.readings, PREVIEW_STATIONS) {
        println!("{}", line);
    }

    println!();
    for path in report.outputs.written() {
        println!("Saved {}", path.display());
    }
}
