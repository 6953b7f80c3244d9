#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Flags are parsed by hand. Environment variables with the `PAGEKIT_DEMO_`
//! prefix provide defaults that explicit flags override.

use std::env;
use std::fmt;
use std::process;
use std::time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
pagekit demo: a scripted visit to the contact page

USAGE:
    pagekit-demo [OPTIONS]

OPTIONS:
    --scenario=NAME      Session to replay (default: valid)
    --latency-ms=N       Simulated send latency in milliseconds (default: 1500)
    --width=N            Width of the rendered notification stack (default: 60)
    --help, -h           Show this help message
    --version, -V        Show version

SCENARIOS:
    valid       Fill the form correctly and submit
    invalid     Submit with several fields failing validation
    failure     Valid form, but the send is rejected
    double      Valid form submitted twice in quick succession

ENVIRONMENT VARIABLES:
    PAGEKIT_DEMO_SCENARIO      Override --scenario
    PAGEKIT_DEMO_LATENCY_MS    Override --latency-ms
    PAGEKIT_DEMO_WIDTH         Override --width
    PAGEKIT_LOG                Log filter (falls back to RUST_LOG, default: info)";

/// Scripted session to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    #[default]
    Valid,
    Invalid,
    Failure,
    Double,
}

impl Scenario {
    pub const ALL: [Self; 4] = [Self::Valid, Self::Invalid, Self::Failure, Self::Double];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Failure => "failure",
            Self::Double => "double",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub scenario: Scenario,
    /// Simulated send latency.
    pub latency: Duration,
    /// Render width for notifications and field errors.
    pub width: usize,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            scenario: Scenario::Valid,
            latency: Duration::from_millis(1500),
            width: 60,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse process arguments and environment, exiting on `--help`,
    /// `--version` or a usage error.
    pub fn parse() -> Self {
        let args = env::args().skip(1);
        match Self::parse_from(args, |key| env::var(key).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("pagekit-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with environment defaults read through `lookup`.
    ///
    /// Unparseable environment values are ignored; unparseable flags are
    /// errors.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, String> {
        let mut opts = Self::default();

        if let Some(val) = lookup("PAGEKIT_DEMO_SCENARIO")
            && let Some(scenario) = Scenario::from_name(val.trim())
        {
            opts.scenario = scenario;
        }
        if let Some(val) = lookup("PAGEKIT_DEMO_LATENCY_MS")
            && let Ok(ms) = val.trim().parse()
        {
            opts.latency = Duration::from_millis(ms);
        }
        if let Some(val) = lookup("PAGEKIT_DEMO_WIDTH")
            && let Ok(n) = val.trim().parse()
        {
            opts.width = n;
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--scenario=") {
                        opts.scenario = Scenario::from_name(val)
                            .ok_or_else(|| format!("Invalid --scenario value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--latency-ms=") {
                        let ms = val
                            .parse()
                            .map_err(|_| format!("Invalid --latency-ms value: {val}"))?;
                        opts.latency = Duration::from_millis(ms);
                    } else if let Some(val) = other.strip_prefix("--width=") {
                        opts.width = val
                            .parse()
                            .map_err(|_| format!("Invalid --width value: {val}"))?;
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Parsed::Run(opts))
    }
}
