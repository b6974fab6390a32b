//! VaultService — the operations behind every command.
//!
//! Each operation resolves the master key, loads what it needs from the
//! repository, and returns plain data for the CLI to print.  Prompting
//! and process execution go through injected collaborators so the whole
//! service can be driven from tests without a terminal.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, Settings};
use crate::crypto::MasterKey;
use crate::environment::{self, EnvVar};
use crate::errors::{EnvBoxError, Result};
use crate::exec::{Executor, ProcessExecutor};
use crate::keystore::{CredentialHelper, DockerCredentialHelper, KeyBackend, KeyStore};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::vault::{RecordRepository, SecretRecord, VaultIndex};

/// Where the value of a new record comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Contents of a file, trimmed of surrounding whitespace.
    File(PathBuf),
    /// A value already in hand (e.g. read from piped stdin).
    Literal(String),
    /// Ask interactively.
    Prompt,
}

/// One line of the terse listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSummary {
    pub name: String,
    pub exposed: Vec<String>,
}

/// Everything needed to start the child process for `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<EnvVar>,
    /// Requested names that are not in the vault.
    pub missing: Vec<String>,
}

pub struct VaultService {
    keystore: KeyStore,
    repository: RecordRepository,
    prompter: Box<dyn Prompter>,
    executor: Box<dyn Executor>,
    settings: Settings,
    host_env: Vec<EnvVar>,
}

impl VaultService {
    /// Build a service from the real process environment: resolve and
    /// create the data directory, load `config.toml`, and pick a
    /// credential helper.
    pub fn from_process_env() -> Result<Self> {
        let data_dir = config::data_dir(|name| std::env::var(name).ok())?;
        config::ensure_data_dir(&data_dir)?;
        let settings = Settings::load(&data_dir)?;
        let helper = DockerCredentialHelper::discover(&settings.helper_choice());

        Ok(Self::new(&data_dir, settings, Box::new(helper))
            .with_host_env(std::env::vars_os().collect()))
    }

    /// A service over `data_dir` that prompts on the terminal, execs
    /// real processes, and starts from an empty host environment.
    pub fn new(data_dir: &Path, settings: Settings, helper: Box<dyn CredentialHelper>) -> Self {
        Self {
            keystore: KeyStore::new(helper, data_dir),
            repository: RecordRepository::new(data_dir),
            prompter: Box::new(TerminalPrompter),
            executor: Box::new(ProcessExecutor),
            settings,
            host_env: Vec::new(),
        }
    }

    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the inherited environment.
    pub fn with_host_env(mut self, host_env: Vec<EnvVar>) -> Self {
        self.host_env = host_env;
        self
    }

    pub fn data_dir(&self) -> &Path {
        self.repository.dir()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn load(&self) -> Result<(MasterKey, VaultIndex)> {
        let key = self.keystore.acquire_key(self.prompter.as_ref())?;
        let index = self.repository.list_all(&key)?;
        Ok((key, index))
    }

    fn find(&self, name: &str) -> Result<SecretRecord> {
        let (_, mut index) = self.load()?;
        index
            .remove(name)
            .ok_or_else(|| EnvBoxError::NotFound(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Add a new record.
    ///
    /// `exposed` defaults to `name`.  With `multi`, keeps prompting for
    /// further variable name/value pairs until an empty name is entered;
    /// a variable name entered twice is `InvalidVariableName`.
    /// Fails with `DuplicateName` before asking for anything if `name`
    /// is already taken.
    pub fn add_secret(
        &self,
        name: &str,
        exposed: Option<&str>,
        source: ValueSource,
        multi: bool,
    ) -> Result<SecretRecord> {
        if name.is_empty() {
            return Err(EnvBoxError::InvalidRecord("record name cannot be empty".into()));
        }

        let (key, index) = self.load()?;
        if index.contains_key(name) {
            return Err(EnvBoxError::DuplicateName(name.to_string()));
        }

        let exposed = exposed.filter(|e| !e.is_empty()).unwrap_or(name);
        validate_variable_name(exposed)?;

        let value = match source {
            ValueSource::File(path) => fs::read_to_string(&path)?.trim().to_string(),
            ValueSource::Literal(value) => value,
            ValueSource::Prompt => self.prompter.prompt_for("value")?,
        };

        let mut record = SecretRecord::single(name, exposed, value);

        if multi {
            loop {
                let var = self.prompter.prompt_for("name")?;
                if var.is_empty() {
                    break;
                }
                validate_variable_name(&var)?;
                if record.variables.contains_key(&var) {
                    return Err(EnvBoxError::InvalidVariableName(var));
                }
                let value = self.prompter.prompt_for("value")?;
                record.variables.insert(var, value);
            }
        }

        let path = self.repository.add(&key, &record)?;
        record.storage_location = Some(path);
        Ok(record)
    }

    /// Name and exposed variable names of every record, sorted by name.
    pub fn list_secrets(&self) -> Result<Vec<SecretSummary>> {
        let (_, index) = self.load()?;
        Ok(index
            .into_values()
            .map(|record| SecretSummary {
                exposed: record.exposed_names().map(str::to_string).collect(),
                name: record.name,
            })
            .collect())
    }

    /// One `name(KEY)=value` line per variable; the `(KEY)` part is
    /// left out when the variable is named after the record.
    pub fn list_secret_values(&self) -> Result<Vec<String>> {
        let (_, index) = self.load()?;
        Ok(index
            .values()
            .flat_map(|record| {
                record
                    .variables
                    .iter()
                    .map(move |(var, value)| list_line(&record.name, var, value))
            })
            .collect())
    }

    /// `KEY: value` lines for one record.
    pub fn show_secret(&self, name: &str) -> Result<Vec<String>> {
        let record = self.find(name)?;
        Ok(record
            .variables
            .iter()
            .map(|(var, value)| format!("{var}: {value}"))
            .collect())
    }

    /// `export KEY="VALUE"` lines for one record, safe to `eval`.
    pub fn export_secret(&self, name: &str) -> Result<Vec<String>> {
        let record = self.find(name)?;
        Ok(record
            .variables
            .iter()
            .map(|(var, value)| export_line(var, value))
            .collect())
    }

    /// Delete the record called `name`.
    pub fn remove_secret(&self, name: &str) -> Result<()> {
        let key = self.keystore.acquire_key(self.prompter.as_ref())?;
        if self.repository.remove(&key, name)? {
            Ok(())
        } else {
            Err(EnvBoxError::NotFound(name.to_string()))
        }
    }

    // ------------------------------------------------------------------
    // Run
    // ------------------------------------------------------------------

    /// Work out what `run` will execute and with which environment.
    ///
    /// With `shell_wrap`, the command runs as `<shell> -c <script>`.  A
    /// single word is the script as written; several words are each
    /// shell-quoted and joined, so every word reaches the shell intact.
    pub fn prepare_run(
        &self,
        names: &[String],
        shell_wrap: bool,
        command: &[String],
    ) -> Result<RunPlan> {
        let Some((first, rest)) = command.split_first() else {
            return Err(EnvBoxError::NoCommandSpecified);
        };

        let (_, index) = self.load()?;
        let composition = environment::compose(&self.host_env, names, &index);

        let (program, args) = if shell_wrap {
            (
                self.settings.shell.clone(),
                vec!["-c".to_string(), shell_script(command)],
            )
        } else {
            (first.clone(), rest.to_vec())
        };

        Ok(RunPlan {
            program,
            args,
            env: composition.env,
            missing: composition.missing,
        })
    }

    /// Hand a prepared plan to the executor.
    pub fn execute(&self, plan: &RunPlan) -> Result<()> {
        self.executor.exec(&plan.program, &plan.args, &plan.env)
    }

    /// `prepare_run` followed by `execute`, logging missing names.
    pub fn run_with_env(&self, names: &[String], shell_wrap: bool, command: &[String]) -> Result<()> {
        let plan = self.prepare_run(names, shell_wrap, command)?;
        for name in &plan.missing {
            tracing::warn!("unable to find {name}");
        }
        self.execute(&plan)
    }

    // ------------------------------------------------------------------
    // Key management
    // ------------------------------------------------------------------

    /// Generate a fresh key and, with `persist`, store it.  An existing
    /// stored key is overwritten without warning.
    pub fn generate_key(&self, persist: bool) -> Result<(MasterKey, Option<KeyBackend>)> {
        let key = MasterKey::generate();
        let backend = if persist {
            Some(self.keystore.store_key(&key)?)
        } else {
            None
        };
        Ok((key, backend))
    }

    /// Prompt (masked) for a key and store it.
    pub fn set_key_interactive(&self) -> Result<KeyBackend> {
        let entered = self.prompter.prompt_masked("enter key")?;
        let key = MasterKey::new(entered.trim())?;
        self.keystore.store_key(&key)
    }

    pub fn clear_key(&self) -> Result<KeyBackend> {
        self.keystore.clear_key()
    }
}

fn shell_script(command: &[String]) -> String {
    match command {
        [script] => script.clone(),
        words => shell_words::join(words),
    }
}

/// Exposed variable names must be usable as environment keys.
fn validate_variable_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(EnvBoxError::InvalidVariableName(name.to_string()));
    }
    Ok(())
}

fn list_line(record: &str, var: &str, value: &str) -> String {
    if var == record {
        format!("{record}={value}")
    } else {
        format!("{record}({var})={value}")
    }
}

/// Render `export KEY="VALUE"`, escaping everything a POSIX shell
/// interprets inside double quotes.
fn export_line(var: &str, value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("export {var}=\"{quoted}\"")
}
