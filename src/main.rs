mod cli;
mod config;
mod metadata;
mod privilege;
mod protocol;
mod provider;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Action, Cli, USAGE, exit_code};
use config::Config;
use pkgkit::backend::dnf::Dnf;
use privilege::EffectiveUid;
use provider::Provider;
use std::io::{self, Read, Write};
use std::process;

fn main() -> Result<()> {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(exit_code(&err))
    });

    run(&cli, io::stdin().lock(), io::stdout().lock())
}

/// The action is checked before any config is read, and `describe` never
/// reads it.
fn run(cli: &Cli, input: impl Read, output: impl Write) -> Result<()> {
    let Some(arg) = cli.action.as_deref() else {
        bail!(USAGE);
    };
    let Some(action) = Action::from_arg(arg) else {
        bail!("unsupported action: '{}'", Action::name_in(arg));
    };

    if action == Action::Describe {
        init_logging(cli.verbose, None);
        return provider::describe(output);
    }

    let config = Config::load(cli.config.as_deref())?;
    init_logging(cli.verbose, config.log_level.as_deref());
    log::debug!("Running action {action:?}");

    let provider = Provider::new(
        Dnf::new(config.dnf_options()),
        EffectiveUid,
        config.retry_config(),
    );
    provider.handle(action, input, output)
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging(verbose: u8, configured: Option<&str>) {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp(None);

    match (verbose, configured) {
        (0, Some(filters)) => {
            builder.parse_filters(filters);
        }
        _ => {
            builder.filter_level(match verbose {
                0 => log::LevelFilter::Warn,
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            });
        }
    }

    builder.parse_env(env_logger::Env::new().filter("RALPKG_LOG"));
    // Already set when run more than once in a process
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::METADATA;
    use std::path::Path;

    fn broken_config(dir: &Path) -> String {
        let path = dir.join("config.toml");
        std::fs::write(&path, "[retry\nmax_attempts = ").unwrap();
        path.display().to_string()
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ralpkg").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_describe_ignores_broken_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = broken_config(dir.path());

        let mut out = Vec::new();
        run(&cli(&["--config", &config, "ral_action=describe"]), io::empty(), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), METADATA);
    }

    #[test]
    fn test_usage_reported_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = broken_config(dir.path());

        let err = run(&cli(&["--config", &config]), io::empty(), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), USAGE);

        let err = run(&cli(&["--config", &config, "ral_action=list"]), io::empty(), Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported action: 'list'");
    }

    #[test]
    fn test_get_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = broken_config(dir.path());

        let mut out = Vec::new();
        let err = run(&cli(&["--config", &config, "ral_action=get"]), "{}".as_bytes(), &mut out)
            .unwrap_err();

        assert!(err.to_string().contains("Invalid TOML format"));
        assert!(out.is_empty());
    }
}
