//! Real dnf backend using `dnf` commands.
//!
//! Queries go through `dnf repoquery`. Goal entries are buffered and only
//! handed to dnf as a `dnf shell` script: resolution runs the script with
//! `--assumeno` and parses the transaction table, download reruns it with
//! `--downloadonly`, apply reruns it with `-y`.

use crate::backend::{Engine, EngineFactory};
use crate::error::{Error, Result};
use crate::types::{GoalEntry, PackageRecord, ResolvedTransaction};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const QUERY_FORMAT: &str = "%{name}\t%{evr}\t%{arch}\n";

/// Settings for launching dnf.
#[derive(Debug, Clone)]
pub struct DnfOptions {
    /// Executable name or absolute path
    pub binary: String,
    /// Extra arguments passed before every subcommand (e.g. `--setopt=...`)
    pub extra_args: Vec<String>,
    /// Run entirely from the metadata cache (`-C`)
    pub cache_only: bool,
}

impl Default for DnfOptions {
    fn default() -> Self {
        Self {
            binary: "dnf".to_string(),
            extra_args: Vec::new(),
            cache_only: false,
        }
    }
}

/// Factory for [`DnfBackend`] handles.
#[derive(Debug, Clone, Default)]
pub struct Dnf {
    options: DnfOptions,
}

impl Dnf {
    pub fn new(options: DnfOptions) -> Self {
        Self { options }
    }
}

impl EngineFactory for Dnf {
    type Engine = DnfBackend;

    fn open(&self) -> Result<DnfBackend> {
        DnfBackend::new(self.options.clone())
    }
}

/// Engine handle that executes real `dnf` commands.
pub struct DnfBackend {
    /// Resolved path to the dnf executable
    dnf_path: PathBuf,
    options: DnfOptions,
    goal: Vec<GoalEntry>,
    closed: bool,
}

impl DnfBackend {
    /// Create a new handle.
    ///
    /// Returns an error if dnf is not installed.
    pub fn new(options: DnfOptions) -> Result<Self> {
        let dnf_path = find_executable(&options.binary).ok_or_else(|| Error::EngineNotFound {
            binary: options.binary.clone(),
        })?;
        log::debug!("Using dnf at {}", dnf_path.display());

        Ok(Self {
            dnf_path,
            options,
            goal: Vec::new(),
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Run a dnf command and return output.
    fn run_dnf(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(&self.dnf_path);
        if self.options.cache_only {
            cmd.arg("-C");
        }
        cmd.args(&self.options.extra_args).args(args);
        log::trace!("Running {cmd:?}");

        cmd.output().map_err(|e| Error::CommandFailed {
            message: format!("failed to execute {}", self.dnf_path.display()),
            stderr: e.to_string(),
        })
    }

    /// Run a dnf command and check for success.
    fn run_dnf_checked(&self, args: &[&str], spec: Option<&str>) -> Result<String> {
        let output = self.run_dnf(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_engine_output(&stderr, spec));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn repoquery(&self, scope: &str, names: &[String]) -> Result<Vec<PackageRecord>> {
        self.ensure_open()?;
        let mut args = vec!["-q", "repoquery", scope, "--queryformat", QUERY_FORMAT, "--"];
        args.extend(names.iter().map(String::as_str));

        let stdout = self.run_dnf_checked(&args, None)?;
        parse_query_output(&stdout)
    }

    /// Write the pending goal to a script and run it through `dnf shell`.
    fn run_goal(&self, flags: &[&str]) -> Result<Output> {
        let mut script = tempfile::Builder::new()
            .prefix("ralpkg-goal-")
            .suffix(".dnf")
            .tempfile()?;
        script.write_all(render_goal_script(&self.goal).as_bytes())?;
        script.flush()?;

        let path = script.path().to_string_lossy().to_string();
        let mut args: Vec<&str> = flags.to_vec();
        args.extend(["shell", path.as_str()]);
        self.run_dnf(&args)
    }

    fn run_goal_checked(&self, flags: &[&str]) -> Result<()> {
        let output = self.run_goal(flags)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(err) = goal_error(&stderr) {
            return Err(err);
        }
        if !output.status.success() {
            return Err(Error::from_engine_output(&stderr, None));
        }
        Ok(())
    }
}

impl Engine for DnfBackend {
    fn query_installed(&self, names: &[String]) -> Result<Vec<PackageRecord>> {
        self.repoquery("--installed", names)
    }

    fn query_available(&self, names: &[String]) -> Result<Vec<PackageRecord>> {
        self.repoquery("--available", names)
    }

    fn submit(&mut self, entry: GoalEntry) -> Result<()> {
        self.ensure_open()?;
        log::debug!("Goal: {} {}", entry.action, entry.spec);
        self.goal.push(entry);
        Ok(())
    }

    fn resolve(&mut self) -> Result<ResolvedTransaction> {
        self.ensure_open()?;
        if self.goal.is_empty() {
            return Ok(ResolvedTransaction::default());
        }

        let output = self.run_goal(&["--assumeno"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(err) = goal_error(&stderr) {
            return Err(err);
        }

        // --assumeno makes dnf exit non-zero even when resolution succeeded,
        // so the table (or "Nothing to do") decides success
        match parse_transaction_table(&stdout) {
            Some(transaction) => Ok(transaction),
            None if stdout.contains("Nothing to do") => Ok(ResolvedTransaction::default()),
            None => Err(Error::from_engine_output(&stderr, None)),
        }
    }

    fn download(&mut self, packages: &[PackageRecord]) -> Result<()> {
        self.ensure_open()?;
        if packages.is_empty() {
            return Ok(());
        }
        log::info!("Downloading {} package(s)", packages.len());
        self.run_goal_checked(&["-y", "--downloadonly"])
    }

    fn apply(&mut self, transaction: &ResolvedTransaction) -> Result<()> {
        self.ensure_open()?;
        if transaction.is_empty() {
            return Ok(());
        }
        log::info!("Applying transaction with {} operation(s)", transaction.len());
        self.run_goal_checked(&["-y"])
    }

    fn close(&mut self) {
        if !self.closed {
            log::trace!("Closing dnf handle");
        }
        self.goal.clear();
        self.closed = true;
    }
}

/// Find an executable by name on PATH, or check an explicit path.
fn find_executable(binary: &str) -> Option<PathBuf> {
    if binary.contains('/') {
        let path = Path::new(binary);
        return path.is_file().then(|| path.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Failure of any goal line.
///
/// `dnf shell` logs a failing line and carries on with the rest of the
/// script, so a usable table or a zero exit status proves nothing on its
/// own. The abort caused by `--assumeno` is not a failure.
fn goal_error(stderr: &str) -> Option<Error> {
    let failed = stderr.lines().map(str::trim).any(|line| {
        line.starts_with("No match for argument")
            || (line.starts_with("Error:") && !line.contains("Operation aborted"))
    });

    failed.then(|| Error::from_engine_output(stderr, unmatched_spec(stderr)))
}

/// Spec named by the first "no match" message, if any.
fn unmatched_spec(stderr: &str) -> Option<&str> {
    stderr.lines().find_map(|line| {
        let (_, spec) = line
            .split_once("No match for argument:")
            .or_else(|| line.split_once("Unable to find a match:"))?;
        spec.split_whitespace().next()
    })
}

/// Render the goal as a `dnf shell` script.
fn render_goal_script(goal: &[GoalEntry]) -> String {
    let mut script = String::new();
    for entry in goal {
        script.push_str(&format!("{} {}\n", entry.action.verb(), entry.spec));
    }
    script.push_str("run\n");
    script
}

/// Parse `name\tevr\tarch` lines from repoquery.
fn parse_query_output(stdout: &str) -> Result<Vec<PackageRecord>> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let mut fields = line.split('\t');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(name), Some(evr), Some(arch)) => {
                    Ok(PackageRecord::new(name.trim(), evr.trim(), arch.trim()))
                }
                _ => Err(Error::Parse(format!("bad repoquery line: {line}"))),
            }
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Install,
    Remove,
    Ignored,
}

fn classify_section(header: &str) -> Section {
    let header = header.trim_end_matches(':').to_lowercase();
    if header.starts_with("installing")
        || header.starts_with("upgrading")
        || header.starts_with("downgrading")
        || header.starts_with("reinstalling")
    {
        Section::Install
    } else if header.starts_with("removing") {
        Section::Remove
    } else {
        Section::Ignored
    }
}

/// Parse the transaction table dnf prints before asking for confirmation.
///
/// Returns `None` when no table is present.
fn parse_transaction_table(stdout: &str) -> Option<ResolvedTransaction> {
    let mut transaction = ResolvedTransaction::default();
    let mut section: Option<Section> = None;
    let mut seen_table = false;
    let mut wrapped_name: Option<String> = None;

    for line in stdout.lines() {
        if line.starts_with("Transaction Summary") {
            break;
        }
        if line.trim().is_empty() || line.starts_with('=') {
            continue;
        }

        if !line.starts_with(' ') && line.trim_end().ends_with(':') {
            section = Some(classify_section(line.trim()));
            seen_table = true;
            wrapped_name = None;
            continue;
        }

        let Some(current) = section else {
            continue;
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() == Some(&"replacing") {
            continue;
        }

        // Long names wrap onto their own line
        if tokens.len() == 1 {
            wrapped_name = Some(tokens[0].to_string());
            continue;
        }
        let fields: Vec<String> = wrapped_name
            .take()
            .into_iter()
            .chain(tokens.iter().map(|t| (*t).to_string()))
            .collect();

        if fields.len() < 3 {
            continue;
        }
        let record = PackageRecord::new(&fields[0], &fields[2], &fields[1]);
        match current {
            Section::Install => transaction.install_set.push(record),
            Section::Remove => transaction.remove_set.push(record),
            Section::Ignored => {}
        }
    }

    seen_table.then_some(transaction)
}
