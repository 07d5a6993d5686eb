#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Arguments are parsed by hand. `NCWRAP_DEMO_*` environment variables
//! provide defaults that explicit flags override.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
ncwrap demo

USAGE:
    ncwrap-demo [OPTIONS]

OPTIONS:
    --demo=N             Start on demo N, 1-indexed (default: 1)
    --image=PATH         Image shown by the mouse demo
    --log-file=PATH      Write logs to PATH
    --no-mouse           Disable mouse event capture
    --help, -h           Show this help message
    --version, -V        Show version

DEMOS:
    1  Text      Styles, alignment and wide glyphs
    2  Planes    Gradients and layered planes
    3  Mouse     Blitted image and click tracking

KEYBINDINGS:
    Up / k      Previous demo
    Down / j    Next demo
    q           Quit

ENVIRONMENT VARIABLES:
    NCWRAP_DEMO_START     Override --demo
    NCWRAP_DEMO_IMAGE     Override --image
    NCWRAP_LOG_FILE       Override --log-file
    NCWRAP_LOG            Log filter (default: warn)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Starting demo, 0-indexed.
    pub start_demo: usize,
    pub image: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub mouse: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            start_demo: 0,
            image: None,
            log_file: None,
            mouse: true,
        }
    }
}

/// What the arguments asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
    Invalid(String),
}

impl Opts {
    /// Parse the process arguments and environment, exiting on `--help`,
    /// `--version` or a bad argument.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(&args, |key| env::var(key).ok()) {
            Parsed::Run(opts) => opts,
            Parsed::Help => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Parsed::Version => {
                println!("ncwrap-demo {VERSION}");
                process::exit(0);
            }
            Parsed::Invalid(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage.");
                process::exit(2);
            }
        }
    }

    pub fn parse_from(args: &[String], lookup: impl Fn(&str) -> Option<String>) -> Parsed {
        let mut opts = Self::default();

        if let Some(n) = lookup("NCWRAP_DEMO_START").and_then(|v| v.parse::<usize>().ok()) {
            opts.start_demo = n.saturating_sub(1);
        }
        if let Some(path) = lookup("NCWRAP_DEMO_IMAGE") {
            opts.image = Some(path.into());
        }
        if let Some(path) = lookup("NCWRAP_LOG_FILE") {
            opts.log_file = Some(path.into());
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Parsed::Help,
                "--version" | "-V" => return Parsed::Version,
                "--no-mouse" => opts.mouse = false,
                other => {
                    if let Some(val) = other.strip_prefix("--demo=") {
                        match val.parse::<usize>() {
                            Ok(n) if n >= 1 => opts.start_demo = n - 1,
                            _ => return Parsed::Invalid(format!("Invalid --demo value: {val}")),
                        }
                    } else if let Some(val) = other.strip_prefix("--image=") {
                        opts.image = Some(val.into());
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(val.into());
                    } else {
                        return Parsed::Invalid(format!("Unknown argument: {other}"));
                    }
                }
            }
        }
        Parsed::Run(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        assert_eq!(Opts::parse_from(&[], no_env), Parsed::Run(Opts::default()));
    }

    #[test]
    fn flags_override_environment() {
        let env = |key: &str| match key {
            "NCWRAP_DEMO_START" => Some("3".to_string()),
            "NCWRAP_DEMO_IMAGE" => Some("env.png".to_string()),
            _ => None,
        };
        let Parsed::Run(opts) = Opts::parse_from(&args(&["--demo=2", "--no-mouse"]), env) else {
            panic!("expected options");
        };
        assert_eq!(opts.start_demo, 1);
        assert_eq!(opts.image, Some(PathBuf::from("env.png")));
        assert!(!opts.mouse);
    }

    #[test]
    fn bad_arguments() {
        assert!(matches!(
            Opts::parse_from(&args(&["--demo=0"]), no_env),
            Parsed::Invalid(_)
        ));
        assert!(matches!(
            Opts::parse_from(&args(&["--frobnicate"]), no_env),
            Parsed::Invalid(_)
        ));
        assert_eq!(Opts::parse_from(&args(&["-h"]), no_env), Parsed::Help);
        assert_eq!(Opts::parse_from(&args(&["-V"]), no_env), Parsed::Version);
    }
}
