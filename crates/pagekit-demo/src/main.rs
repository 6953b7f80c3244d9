#![forbid(unsafe_code)]

//! pagekit demo binary entry point.

use pagekit::PageConfig;
use pagekit_demo::{app, cli, init_logging};

fn main() {
    let opts = cli::Opts::parse();
    init_logging();

    let config = match PageConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    match app::run(&opts, &config) {
        Ok(report) => print!("{}", report.render()),
        Err(e) => {
            eprintln!("Session failed: {e}");
            std::process::exit(1);
        }
    }
}
