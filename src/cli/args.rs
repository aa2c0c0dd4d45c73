//! Command-line arguments for the `verity` binary.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::Parser;

use crate::errors::VerityError;
use crate::reporter::REPORTER_NAMES;
use crate::runtime::{RuntimeOptions, TeardownPolicy};

#[derive(Debug, Parser)]
#[command(
    name = "verity",
    version,
    about = "Discovers and runs test scenarios, explaining every mismatch."
)]
pub struct VerityArgs {
    /// Files or directories to search for test modules.
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// How to report progress and results.
    #[arg(
        short,
        long,
        default_value = "feature",
        value_parser = PossibleValuesParser::new(REPORTER_NAMES)
    )]
    pub reporter: String,

    /// Stop the whole run at the first failure or error.
    #[arg(short, long)]
    pub immediate: bool,

    /// Only load files matching this glob.
    #[arg(long)]
    pub glob: Option<String>,

    /// Skip files matching this glob. May be repeated.
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,

    /// Record warnings emitted during the run and list them at the end.
    #[arg(long)]
    pub reap_warnings: bool,

    /// Run teardowns even when an immediate abort is under way.
    #[arg(long)]
    pub teardown_on_abort: bool,

    /// YAML file with runtime options. Flags take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl VerityArgs {
    /// Merges the config file, if any, with the flags.
    pub fn options(&self) -> Result<RuntimeOptions, VerityError> {
        let mut options = match &self.config {
            Some(path) => RuntimeOptions::from_yaml_file(path)?,
            None => RuntimeOptions::default(),
        };
        if self.immediate {
            options.immediate = true;
        }
        if let Some(glob) = &self.glob {
            options.glob_pattern = glob.clone();
        }
        options.excludes.extend(self.excludes.iter().cloned());
        if self.reap_warnings {
            options.reap_warnings = true;
        }
        if self.teardown_on_abort {
            options.teardown_policy = TeardownPolicy::Always;
        }
        if options.glob_pattern.is_empty() {
            return Err(VerityError::Config {
                message: "the glob pattern must not be empty".to_string(),
            });
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(args: &[&str]) -> VerityArgs {
        VerityArgs::try_parse_from(std::iter::once("verity").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.paths, vec![PathBuf::from(".")]);
        assert_eq!(args.reporter, "feature");
        assert_eq!(args.options().unwrap(), RuntimeOptions::default());
    }

    #[test]
    fn test_flags_map_to_options() {
        let args = parse(&[
            "tests",
            "-i",
            "--glob",
            "*.yaml",
            "--exclude",
            "slow*",
            "--teardown-on-abort",
            "--reap-warnings",
        ]);
        let options = args.options().unwrap();
        assert!(options.immediate);
        assert!(options.reap_warnings);
        assert_eq!(options.glob_pattern, "*.yaml");
        assert_eq!(options.excludes, vec!["slow*".to_string()]);
        assert_eq!(options.teardown_policy, TeardownPolicy::Always);
    }

    #[test]
    fn test_unknown_reporter_is_rejected() {
        assert!(VerityArgs::try_parse_from(["verity", "-r", "spec"]).is_err());
    }

    #[test]
    fn test_config_file_is_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "glob_pattern: \"spec_*\"\nexcludes: [\"a*\"]").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let options = parse(&["--config", &path, "--exclude", "b*"]).options().unwrap();
        assert_eq!(options.glob_pattern, "spec_*");
        assert_eq!(options.excludes, vec!["a*".to_string(), "b*".to_string()]);
    }

    #[test]
    fn test_empty_glob_is_a_config_error() {
        let error = parse(&["--glob", ""]).options().unwrap_err();
        assert!(matches!(error, VerityError::Config { .. }));
    }
}
