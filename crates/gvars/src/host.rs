//! The interfaces GVars needs from its host: a construction environment, a source of
//! command-line variables and a registry of command-line options.

use std::path::Path;

use indexmap::IndexMap;

use crate::decl::{OptParams, VarDecl};
use crate::errors::GVarResult;
use crate::value::Value;

/// Read access to a key/value store that can interpolate `$NAME` / `${NAME}` placeholders.
pub trait Environment {
    fn get(&self, key: &str) -> GVarResult<Option<Value>>;

    fn contains(&self, key: &str) -> GVarResult<bool>;

    /// All `(key, value)` pairs, in the store's own order.
    fn items(&self) -> GVarResult<Vec<(String, Value)>>;

    /// Interpolate placeholders in `template` using the store's values.
    fn subst(&self, template: &str) -> GVarResult<String>;
}

pub trait EnvironmentMut: Environment {
    fn set(&mut self, key: &str, value: Value) -> GVarResult<()>;

    fn remove(&mut self, key: &str) -> GVarResult<Option<Value>>;

    /// Set `key` only if it is not set yet.
    fn set_default(&mut self, key: &str, value: Value) -> GVarResult<()> {
        if !self.contains(key)? {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Command-line `NAME=value` variables.
pub trait VariableSource {
    fn add_variable(&mut self, decl: &VarDecl) -> GVarResult<()>;

    /// Write the current value of every declared variable into `target`. When `args` is given, it
    /// replaces the assignments the source collected from the command line.
    fn update(
        &self,
        target: &mut dyn EnvironmentMut,
        args: Option<&IndexMap<String, String>>,
    ) -> GVarResult<()>;

    fn save(&self, path: &Path, env: &dyn Environment) -> GVarResult<()>;

    fn generate_help_text(&self, env: &dyn Environment) -> GVarResult<String>;
}

/// Command-line `--flag=value` options.
pub trait OptionRegistry {
    fn add_option(&mut self, names: &[String], params: &OptParams) -> GVarResult<()>;

    /// The parsed value of the option whose destination is `dest`, falling back to its default.
    fn get_option(&self, dest: &str) -> Option<Value>;
}

impl<T: Environment + ?Sized> Environment for &T {
    fn get(&self, key: &str) -> GVarResult<Option<Value>> {
        (**self).get(key)
    }

    fn contains(&self, key: &str) -> GVarResult<bool> {
        (**self).contains(key)
    }

    fn items(&self) -> GVarResult<Vec<(String, Value)>> {
        (**self).items()
    }

    fn subst(&self, template: &str) -> GVarResult<String> {
        (**self).subst(template)
    }
}

impl<T: Environment + ?Sized> Environment for &mut T {
    fn get(&self, key: &str) -> GVarResult<Option<Value>> {
        (**self).get(key)
    }

    fn contains(&self, key: &str) -> GVarResult<bool> {
        (**self).contains(key)
    }

    fn items(&self) -> GVarResult<Vec<(String, Value)>> {
        (**self).items()
    }

    fn subst(&self, template: &str) -> GVarResult<String> {
        (**self).subst(template)
    }
}

impl<T: EnvironmentMut + ?Sized> EnvironmentMut for &mut T {
    fn set(&mut self, key: &str, value: Value) -> GVarResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> GVarResult<Option<Value>> {
        (**self).remove(key)
    }

    fn set_default(&mut self, key: &str, value: Value) -> GVarResult<()> {
        (**self).set_default(key, value)
    }
}
