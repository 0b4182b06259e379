use clap::Parser;
use std::path::PathBuf;

/// Printed when no action is given.
pub const USAGE: &str = "usage: ralpkg ral_action=<action>";

#[derive(Debug, Parser)]
#[command(name = "ralpkg")]
#[command(version)]
#[command(about = "dnf package resource provider", long_about = None)]
pub struct Cli {
    /// Verbosity level (logs go to stderr)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file
    #[arg(long, env = "RALPKG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Action to run, as `ral_action=<describe|get|set>`
    pub action: Option<String>,
}

/// Exit status for an argument error. Help and version output are not
/// failures; anything else is a usage error and exits 1.
pub fn exit_code(err: &clap::Error) -> i32 {
    i32::from(err.use_stderr())
}

/// Provider actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Print the capability document
    Describe,
    /// Report current package state
    Get,
    /// Converge package state
    Set,
}

impl Action {
    /// Parse an action argument. Everything up to the last `=` is ignored,
    /// so both `ral_action=get` and a bare `get` are accepted.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.rsplit('=').next().unwrap_or(arg) {
            "describe" => Some(Self::Describe),
            "get" => Some(Self::Get),
            "set" => Some(Self::Set),
            _ => None,
        }
    }

    /// Value to report in diagnostics for an argument.
    pub fn name_in(arg: &str) -> &str {
        arg.rsplit('=').next().unwrap_or(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_arg() {
        assert_eq!(Action::from_arg("ral_action=describe"), Some(Action::Describe));
        assert_eq!(Action::from_arg("ral_action=get"), Some(Action::Get));
        assert_eq!(Action::from_arg("set"), Some(Action::Set));
        assert_eq!(Action::from_arg("ral_action=list"), None);
        assert_eq!(Action::from_arg("ral_action="), None);
    }

    #[test]
    fn test_action_name_in() {
        assert_eq!(Action::name_in("ral_action=list"), "list");
        assert_eq!(Action::name_in("bogus"), "bogus");
    }

    #[test]
    fn test_cli_parses_positional_action() {
        let cli = Cli::try_parse_from(["ralpkg", "-vv", "ral_action=get"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.action.as_deref(), Some("ral_action=get"));
    }

    #[test]
    fn test_extra_arguments_are_usage_errors() {
        let err = Cli::try_parse_from(["ralpkg", "ral_action=get", "extra"]).unwrap_err();
        assert_eq!(exit_code(&err), 1);

        let err = Cli::try_parse_from(["ralpkg", "--bogus", "ral_action=get"]).unwrap_err();
        assert_eq!(exit_code(&err), 1);

        let err = Cli::try_parse_from(["ralpkg", "--help"]).unwrap_err();
        assert_eq!(exit_code(&err), 0);
    }
}
