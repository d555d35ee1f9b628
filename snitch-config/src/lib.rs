//! Snitch Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Snitch crates.

use serde::Deserialize;
use std::path::PathBuf;

/// Default destination for caught-error records.
pub const DEFAULT_LOG_DESTINATION: &str = "/dev/stdout";

/// Options for the exception-handler instrumentation hook
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// File every record is appended to
    #[serde(alias = "log_file")]
    pub log_destination: PathBuf,
    /// Identifier substrings, one of which must match (empty matches all)
    #[serde(deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    /// Identifier substrings that disqualify a module
    pub exclude: Vec<String>,
    /// Only instrument submodules of packages
    pub restrict_to_packages: bool,
}

/// Configuration for execution limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum operand stack size
    pub max_stack_size: usize,
    /// Maximum call depth, imports included
    pub max_recursion_depth: usize,
    /// Maximum length in bytes of a string built by repetition
    pub max_string_length: usize,
}

/// Execution phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexer,
    Parser,
    Compiler,
    Vm,
    Import,
    Hook,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Lexer,
        Phase::Parser,
        Phase::Compiler,
        Phase::Vm,
        Phase::Import,
        Phase::Hook,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Parser => "parser",
            Phase::Compiler => "compiler",
            Phase::Vm => "vm",
            Phase::Import => "import",
            Phase::Hook => "hook",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("snitch::{}", self.as_str())
    }
}

impl HookConfig {
    /// Hook writing to `destination` that instruments every module.
    pub fn with_destination(destination: impl Into<PathBuf>) -> Self {
        Self {
            log_destination: destination.into(),
            ..Self::default()
        }
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            log_destination: PathBuf::from(DEFAULT_LOG_DESTINATION),
            include: Vec::new(),
            exclude: Vec::new(),
            restrict_to_packages: false,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 4096,
            max_recursion_depth: 256,
            max_string_length: 1 << 24,
        }
    }
}

/// `include` is accepted as a single string or a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
