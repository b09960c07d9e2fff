mod decls;

use std::cell::Cell;
use std::fmt::Write;
use std::path::Path;

use indexmap::IndexMap;

use crate::decl::{OptParams, VarDecl};
use crate::errors::{GVarError, GVarResult};
use crate::host::{Environment, EnvironmentMut, OptionRegistry, VariableSource};
use crate::resubst::{NameTable, resubst_str};
use crate::value::Value;

/// In-memory environment. `subst` resolves placeholders until nothing changes.
#[derive(Debug, Default, Clone)]
pub(crate) struct TestEnv {
    pub vars: IndexMap<String, Value>,
}

impl TestEnv {
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for TestEnv {
    fn get(&self, key: &str) -> GVarResult<Option<Value>> {
        Ok(self.vars.get(key).cloned())
    }

    fn contains(&self, key: &str) -> GVarResult<bool> {
        Ok(self.vars.contains_key(key))
    }

    fn items(&self) -> GVarResult<Vec<(String, Value)>> {
        Ok(self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn subst(&self, template: &str) -> GVarResult<String> {
        let table: NameTable = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.render()))
            .collect();
        let mut value = template.to_string();
        for _ in 0..16 {
            let new_value = resubst_str(&value, &table);
            if new_value == value {
                return Ok(value);
            }
            value = new_value;
        }
        Err(GVarError::RecursiveReference { var: value })
    }
}

impl EnvironmentMut for TestEnv {
    fn set(&mut self, key: &str, value: Value) -> GVarResult<()> {
        self.vars.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GVarResult<Option<Value>> {
        Ok(self.vars.shift_remove(key))
    }
}

/// Command-line variables with canned `NAME=value` assignments.
#[derive(Debug, Default)]
pub(crate) struct TestVariables {
    pub decls: Vec<VarDecl>,
    pub assignments: IndexMap<String, String>,
    pub updates: Cell<usize>,
}

impl TestVariables {
    pub fn assign<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.assignments.insert(key.into(), value.into());
        self
    }

    pub fn keys(&self) -> Vec<&str> {
        self.decls.iter().map(VarDecl::key).collect()
    }
}

impl VariableSource for TestVariables {
    fn add_variable(&mut self, decl: &VarDecl) -> GVarResult<()> {
        self.decls.push(decl.clone());
        Ok(())
    }

    fn update(
        &self,
        target: &mut dyn EnvironmentMut,
        args: Option<&IndexMap<String, String>>,
    ) -> GVarResult<()> {
        self.updates.set(self.updates.get() + 1);
        let assignments = args.unwrap_or(&self.assignments);
        for decl in &self.decls {
            let value = match assignments.get(decl.key()) {
                Some(raw) => Value::from(raw),
                None => match decl.default() {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };
            let value = match decl.converter() {
                Some(converter) => converter.convert(&value)?,
                None => value,
            };
            target.set(decl.key(), value.clone())?;
            if let Some(validator) = decl.validator() {
                validator.validate(decl.key(), &value, &target)?;
            }
        }
        Ok(())
    }

    fn save(&self, path: &Path, env: &dyn Environment) -> GVarResult<()> {
        let mut out = String::new();
        for decl in &self.decls {
            if let Some(value) = env.get(decl.key())? {
                writeln!(out, "{} = {:?}", decl.key(), value.render()).map_err(anyhow::Error::from)?;
            }
        }
        std::fs::write(path, out).map_err(anyhow::Error::from)?;
        Ok(())
    }

    fn generate_help_text(&self, env: &dyn Environment) -> GVarResult<String> {
        let mut out = String::new();
        for decl in &self.decls {
            let actual = env.get(decl.key())?.map(|v| v.render()).unwrap_or_default();
            write!(
                out,
                "\n{}: {}\n    actual: {}\n",
                decl.key(),
                decl.help(),
                actual
            )
            .map_err(anyhow::Error::from)?;
        }
        Ok(out)
    }
}

/// Option registry with canned parse results.
#[derive(Debug, Default)]
pub(crate) struct TestOptions {
    pub added: Vec<(Vec<String>, OptParams)>,
    pub parsed: IndexMap<String, Value>,
}

impl TestOptions {
    pub fn parse<K: Into<String>, V: Into<Value>>(mut self, dest: K, value: V) -> Self {
        self.parsed.insert(dest.into(), value.into());
        self
    }
}

impl OptionRegistry for TestOptions {
    fn add_option(&mut self, names: &[String], params: &OptParams) -> GVarResult<()> {
        self.added.push((names.to_vec(), params.clone()));
        Ok(())
    }

    fn get_option(&self, dest: &str) -> Option<Value> {
        self.parsed.get(dest).cloned().or_else(|| {
            self.added
                .iter()
                .find(|(_, p)| p.dest == dest)
                .and_then(|(_, p)| p.default.clone())
        })
    }
}
