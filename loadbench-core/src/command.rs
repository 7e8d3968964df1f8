//! Resolved Tool Commands
//!
//! A `Command` is what a builder hands to the process-execution layer: an
//! argument vector (never containing secrets), a working directory,
//! environment overrides, and any files the tool expects to find.

use crate::secret::Secret;
use std::fmt;
use std::path::PathBuf;

/// Value of an environment override
#[derive(Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// Ordinary value, safe to log
    Plain(String),
    /// Credential, redacted in every rendering
    Secret(Secret),
}

impl EnvValue {
    /// The value to place in the child's environment
    pub fn expose(&self) -> &str {
        match self {
            EnvValue::Plain(v) => v,
            EnvValue::Secret(s) => s.expose(),
        }
    }

    /// Whether this value must be redacted
    pub fn is_secret(&self) -> bool {
        matches!(self, EnvValue::Secret(_))
    }
}

impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Plain(v) => write!(f, "{:?}", v),
            EnvValue::Secret(_) => f.write_str("****"),
        }
    }
}

/// A single environment variable override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverride {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: EnvValue,
}

/// A file the tool needs in its working directory (e.g. a HammerDB script)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the command's working directory
    pub relative_path: PathBuf,
    /// File contents; never contains secrets
    pub contents: String,
}

/// A fully resolved tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Executable name or path
    pub program: String,
    /// Arguments, one element per argv entry
    pub args: Vec<String>,
    /// Working directory for the process
    pub working_dir: PathBuf,
    /// Environment overrides applied on top of the inherited environment
    pub env: Vec<EnvOverride>,
    /// Files to write into the working directory before spawning
    pub files: Vec<GeneratedFile>,
    /// File the tool writes its summary to; appended to the captured output
    /// before the final result is extracted
    pub result_file: Option<PathBuf>,
}

impl Command {
    /// New command with no arguments
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: Vec::new(),
            files: Vec::new(),
            result_file: None,
        }
    }

    /// Append one argument
    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a plain environment override
    pub fn env(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.push(EnvOverride {
            name: name.into(),
            value: EnvValue::Plain(value.into()),
        });
        self
    }

    /// Add a secret environment override
    pub fn secret_env(&mut self, name: impl Into<String>, value: Secret) -> &mut Self {
        self.env.push(EnvOverride {
            name: name.into(),
            value: EnvValue::Secret(value),
        });
        self
    }

    /// Attach a generated file
    pub fn file(&mut self, relative_path: impl Into<PathBuf>, contents: String) -> &mut Self {
        self.files.push(GeneratedFile {
            relative_path: relative_path.into(),
            contents,
        });
        self
    }

    /// Look up an environment override by name
    pub fn env_value(&self, name: &str) -> Option<&EnvValue> {
        self.env.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    /// Render a shell-invocable command line.
    ///
    /// Arguments containing shell metacharacters are single-quoted.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./:,@%+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quoting() {
        let mut cmd = Command::new("mysql", "/tmp");
        cmd.args(["-h", "db1", "-e", "DROP TABLE IF EXISTS t"]);
        assert_eq!(cmd.command_line(), "mysql -h db1 -e 'DROP TABLE IF EXISTS t'");
    }

    #[test]
    fn test_quote_embedded_single_quote() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_secret_env_redacted_in_debug() {
        let mut cmd = Command::new("sysbench", ".");
        cmd.env("LANG", "C").secret_env("MYSQL_PWD", Secret::new("pw123"));
        let debug = format!("{:?}", cmd);
        assert!(!debug.contains("pw123"));
        assert!(debug.contains("\"C\""));
        assert_eq!(cmd.env_value("MYSQL_PWD").unwrap().expose(), "pw123");
        assert!(!cmd.command_line().contains("pw123"));
    }
}
