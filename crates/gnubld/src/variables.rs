use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gvars::{Environment, EnvironmentMut, GVarResult, Value, VarDecl, VariableSource};
use gvars_util::quote::{quote, unquote};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::GnuBuildResult;

static ASSIGNMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<key>[_a-zA-Z][_a-zA-Z0-9]*)=(?P<value>.*)$").unwrap());

static FILE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<key>[_a-zA-Z][_a-zA-Z0-9]*)\s*=\s*(?P<value>.*?)\s*$").unwrap()
});

/// Split a `NAME=value` command-line word.
pub fn parse_assignment(word: &str) -> Option<(&str, &str)> {
    let caps = ASSIGNMENT_REGEX.captures(word)?;
    Some((caps.name("key")?.as_str(), caps.name("value")?.as_str()))
}

/// Read a variables file: `KEY = "value"` (or unquoted `KEY = value`) per line, `#` comments.
pub fn read_variables_file(path: &Path) -> GnuBuildResult<IndexMap<String, String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read variables file {}", path.display()))?;

    let mut ret = IndexMap::new();
    for (lineno, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let caps = FILE_LINE_REGEX.captures(line).with_context(|| {
            format!("{}:{}: expected KEY = value", path.display(), lineno + 1)
        })?;
        let raw = &caps["value"];
        let value = match raw.starts_with('"') {
            true => unquote(raw).with_context(|| {
                format!("{}:{}: malformed quoted value", path.display(), lineno + 1)
            })?,
            false => raw.to_string(),
        };
        ret.insert(caps["key"].to_string(), value);
    }

    debug!(path = %path.display(), count = ret.len(), "read variables file");
    Ok(ret)
}

/// Command-line `NAME=value` variables.
///
/// Values are applied in this order, later ones winning: declared defaults, variables files
/// (in the order given), command-line assignments.
#[derive(Debug, Default)]
pub struct Variables {
    decls: IndexMap<String, VarDecl>,
    files: Vec<PathBuf>,
    args: IndexMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn with_args(mut self, args: IndexMap<String, String>) -> Self {
        self.args = args;
        self
    }

    /// Take the `NAME=value` words out of `words`, returning the rest.
    pub fn collect_args<S: AsRef<str>>(&mut self, words: &[S]) -> Vec<String> {
        let mut rest = vec![];
        for word in words {
            let word = word.as_ref();
            match parse_assignment(word) {
                Some((key, value)) => {
                    self.args.insert(key.to_string(), value.to_string());
                }
                None => rest.push(word.to_string()),
            }
        }
        rest
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&VarDecl> {
        self.decls.get(key)
    }

    pub fn args(&self) -> &IndexMap<String, String> {
        &self.args
    }

    /// Command-line assignments to variables nobody declared.
    pub fn unknown_variables(&self) -> Vec<&str> {
        self.args
            .keys()
            .filter(|k| !self.decls.contains_key(*k))
            .map(String::as_str)
            .collect()
    }

    fn is_set(env: &dyn Environment, key: &str) -> GVarResult<bool> {
        Ok(env.get(key)?.is_some_and(|v| !v.is_none()))
    }

    fn subst_key(env: &dyn Environment, key: &str) -> GVarResult<String> {
        env.subst(&format!("${{{key}}}"))
    }
}

impl VariableSource for Variables {
    fn add_variable(&mut self, decl: &VarDecl) -> GVarResult<()> {
        if self.decls.contains_key(decl.key()) {
            warn!(key = decl.key(), "variable declared twice, keeping the last declaration");
        }
        self.decls.insert(decl.key().to_string(), decl.clone());
        Ok(())
    }

    fn update(
        &self,
        target: &mut dyn EnvironmentMut,
        args: Option<&IndexMap<String, String>>,
    ) -> GVarResult<()> {
        let mut values: IndexMap<&str, Value> = IndexMap::new();
        for (key, decl) in &self.decls {
            if let Some(default) = decl.default() {
                values.insert(key.as_str(), default.clone());
            }
        }

        let mut files = vec![];
        for path in &self.files {
            if path.exists() {
                files.push(read_variables_file(path)?);
            } else {
                trace!(path = %path.display(), "variables file does not exist");
            }
        }
        for (key, value) in files.iter().flatten().chain(args.unwrap_or(&self.args)) {
            if let Some((key, _)) = self.decls.get_key_value(key) {
                values.insert(key.as_str(), Value::from(value));
            }
        }

        for (key, value) in values {
            target.set(key, value)?;
        }

        for (key, decl) in &self.decls {
            let Some(converter) = decl.converter() else {
                continue;
            };
            if Self::is_set(&target, key)? {
                let raw = Value::String(Self::subst_key(&target, key)?);
                target.set(key, converter.convert(&raw)?)?;
            }
        }

        for (key, decl) in &self.decls {
            let Some(validator) = decl.validator() else {
                continue;
            };
            if Self::is_set(&target, key)? {
                let value = Value::String(Self::subst_key(&target, key)?);
                validator.validate(key, &value, &target)?;
            }
        }

        Ok(())
    }

    fn save(&self, path: &Path, env: &dyn Environment) -> GVarResult<()> {
        let mut out = String::new();
        for (key, decl) in &self.decls {
            let Some(value) = env.get(key)?.filter(|v| !v.is_none()) else {
                continue;
            };

            let current = Self::subst_key(env, key)?;
            let default = match decl.default() {
                Some(default) => {
                    let default = Value::String(env.subst(&default.render())?);
                    match decl.converter() {
                        Some(converter) => converter.convert(&default)?.render(),
                        None => default.render(),
                    }
                }
                None => String::new(),
            };

            if current != default {
                writeln!(out, "{key} = {}", quote(&value.render())).map_err(anyhow::Error::from)?;
            }
        }

        std::fs::write(path, out)
            .with_context(|| format!("failed to write variables file {}", path.display()))?;
        debug!(path = %path.display(), "saved variables");
        Ok(())
    }

    fn generate_help_text(&self, env: &dyn Environment) -> GVarResult<String> {
        let mut out = String::new();
        for (key, decl) in &self.decls {
            let default = decl
                .default()
                .map(Value::render)
                .unwrap_or_else(|| "None".to_string());
            let actual = match Self::is_set(env, key)? {
                true => Self::subst_key(env, key)?,
                false => "None".to_string(),
            };
            write!(
                out,
                "\n{key}: {}\n    default: {default}\n    actual: {actual}\n",
                decl.help()
            )
            .map_err(anyhow::Error::from)?;
        }
        Ok(out)
    }
}
