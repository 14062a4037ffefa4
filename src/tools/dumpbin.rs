use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::DumpTool;
use crate::error::{AuditError, Result};
use crate::parsers::{DumpMode, RawDump};

const TOOL_NAME: &str = "dumpbin";
const DUMPBIN_EXE_VAR: &str = "DUMPBIN_EXE";
const VSENV_SCRIPT: &str = include_str!("vsenv.bat");
const VSENV_SCRIPT_NAME: &str = "dlltree-vsenv.bat";

/// Environment variables dumpbin runs under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    vars: BTreeMap<String, String>,
}

impl ToolEnvironment {
    /// Parse `NAME=VALUE` lines as printed by `set`.
    pub fn parse(output: &str) -> Self {
        let vars = output
            .lines()
            .filter_map(|line| line.split_once('='))
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self { vars }
    }

    /// The current process environment with `DUMPBIN_EXE` pointing at `exe`.
    pub fn inherit(exe: &Path) -> Self {
        let mut vars: BTreeMap<String, String> = std::env::vars().collect();
        vars.insert(DUMPBIN_EXE_VAR.to_string(), exe.to_string_lossy().into_owned());
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn dumpbin_exe(&self) -> Option<PathBuf> {
        self.get(DUMPBIN_EXE_VAR).map(PathBuf::from)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Runs the MSVC `dumpbin` tool.
///
/// Setting up the Visual Studio developer environment takes seconds, so it is
/// computed on first use and shared by every later invocation, including
/// those running concurrently on other worker threads.
pub struct Dumpbin {
    executable: Option<PathBuf>,
    setup_script: Option<PathBuf>,
    environment: OnceLock<std::result::Result<ToolEnvironment, String>>,
}

impl Dumpbin {
    /// Locate dumpbin through the bundled developer-environment script.
    pub fn new() -> Self {
        Self {
            executable: None,
            setup_script: None,
            environment: OnceLock::new(),
        }
    }

    /// Run this dumpbin under the current environment, skipping Visual Studio
    /// discovery.
    pub fn with_executable(mut self, exe: impl Into<PathBuf>) -> Self {
        self.executable = Some(exe.into());
        self
    }

    /// Use a custom environment script instead of the bundled one. It must
    /// print `NAME=VALUE` lines including `DUMPBIN_EXE`.
    pub fn with_setup_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.setup_script = Some(script.into());
        self
    }

    /// The tool environment, computed at most once.
    pub fn environment(&self) -> Result<&ToolEnvironment> {
        self.environment
            .get_or_init(|| self.compute_environment().map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|message| AuditError::tool(TOOL_NAME, message.clone()))
    }

    fn compute_environment(&self) -> Result<ToolEnvironment> {
        if let Some(exe) = &self.executable {
            debug!("Using dumpbin at {}", exe.display());
            return Ok(ToolEnvironment::inherit(exe));
        }

        let script = match &self.setup_script {
            Some(script) => script.clone(),
            None => {
                let script = std::env::temp_dir().join(VSENV_SCRIPT_NAME);
                fs::write(&script, VSENV_SCRIPT)?;
                script
            }
        };

        info!("Setting up developer environment via {}", script.display());
        let output = Command::new("cmd")
            .arg("/C")
            .arg(&script)
            .output()
            .map_err(|err| {
                AuditError::tool(TOOL_NAME, format!("cannot run {}: {err}", script.display()))
            })?;
        if !output.status.success() {
            return Err(AuditError::tool(
                TOOL_NAME,
                format!(
                    "{} exited with {}: {}",
                    script.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let environment = ToolEnvironment::parse(&String::from_utf8_lossy(&output.stdout));
        if environment.dumpbin_exe().is_none() {
            return Err(AuditError::tool(
                TOOL_NAME,
                format!("{} did not define {DUMPBIN_EXE_VAR}", script.display()),
            ));
        }
        debug!("Developer environment has {} variables", environment.len());
        Ok(environment)
    }

    /// Run dumpbin with `option` on `file` and return its normalized stdout.
    pub fn run(&self, file: &Path, option: &str) -> Result<String> {
        let environment = self.environment()?;
        let exe = environment.dumpbin_exe().ok_or_else(|| {
            AuditError::tool(TOOL_NAME, format!("{DUMPBIN_EXE_VAR} is not set"))
        })?;

        debug!("{} /nologo {} {}", exe.display(), option, file.display());
        let output = Command::new(&exe)
            .arg("/nologo")
            .arg(option)
            .arg(file)
            .env_clear()
            .envs(environment.vars())
            .output()
            .map_err(|err| {
                AuditError::tool(TOOL_NAME, format!("cannot run {}: {err}", exe.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n");
        if !output.status.success() {
            // dumpbin reports most errors on stdout.
            return Err(AuditError::tool(
                TOOL_NAME,
                format!(
                    "{option} {} exited with {}: {}",
                    file.display(),
                    output.status,
                    stdout.trim()
                ),
            ));
        }

        Ok(format!("{}\n", stdout.trim()))
    }
}

impl Default for Dumpbin {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpTool for Dumpbin {
    fn dump(&self, path: &Path, mode: DumpMode) -> Result<RawDump> {
        let text = self.run(path, mode.option())?;
        Ok(RawDump::new(path, text))
    }

    fn tool_name(&self) -> &str {
        TOOL_NAME
    }
}
