//! Namespace views over an environment.

use tracing::trace;

use crate::errors::{GVarError, GVarResult};
use crate::host::{Environment, EnvironmentMut};
use crate::resubst::{NameTable, build_iresubst_table, build_resubst_table, invert, resubst, resubst_str};
use crate::value::Value;

/// The four tables an [`EnvProxy`] rewrites with. `rename` maps the proxy's keys onto the keys of
/// the underlying environment; the other three are derived from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyTables {
    rename: NameTable,
    irename: NameTable,
    resubst: NameTable,
    iresubst: NameTable,
}

impl ProxyTables {
    pub fn new(rename: NameTable) -> Self {
        ProxyTables {
            irename: invert(&rename),
            resubst: build_resubst_table(&rename),
            iresubst: build_iresubst_table(&rename),
            rename,
        }
    }

    pub fn rename(&self) -> &NameTable {
        &self.rename
    }

    pub fn irename(&self) -> &NameTable {
        &self.irename
    }

    pub fn resubst(&self) -> &NameTable {
        &self.resubst
    }

    pub fn iresubst(&self) -> &NameTable {
        &self.iresubst
    }
}

/// A view of environment `E` through another namespace's keys.
///
/// Keys are translated through [`ProxyTables::rename`] before they reach `E`. String values are
/// rewritten on the way in (`$key` placeholders become placeholders of the environment's keys)
/// and on the way out (the reverse).
///
/// A *strict* proxy refuses keys it has no translation for with [`GVarError::UndeclaredKey`]. A
/// non-strict proxy passes them to `E` unchanged, so whatever else lives in `E` stays reachable.
///
/// `E` is usually a `&dyn Environment` or `&mut dyn EnvironmentMut`; [`EnvProxy`] itself
/// implements both traits, so it can be handed to anything expecting an environment.
pub struct EnvProxy<'t, E> {
    env: E,
    tables: &'t ProxyTables,
    strict: bool,
}

impl<'t, E: Environment> EnvProxy<'t, E> {
    pub fn new(env: E, tables: &'t ProxyTables, strict: bool) -> Self {
        EnvProxy {
            env,
            tables,
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether `key` has a translation, regardless of what the environment holds.
    pub fn has_key(&self, key: &str) -> bool {
        self.tables.rename.contains_key(key)
    }

    pub fn tables(&self) -> &ProxyTables {
        self.tables
    }

    pub fn into_inner(self) -> E {
        self.env
    }

    fn translate<'a>(&'a self, key: &'a str) -> GVarResult<&'a str> {
        match self.tables.rename.get(key) {
            Some(real) => Ok(real.as_str()),
            None if self.strict => Err(GVarError::UndeclaredKey {
                key: key.to_string(),
            }),
            None => Ok(key),
        }
    }

    /// Keys visible through this proxy, in the environment's order.
    pub fn keys(&self) -> GVarResult<Vec<String>> {
        Ok(self.items()?.into_iter().map(|(k, _)| k).collect())
    }
}

impl<E: Environment> Environment for EnvProxy<'_, E> {
    fn get(&self, key: &str) -> GVarResult<Option<Value>> {
        let real = self.translate(key)?;
        Ok(self
            .env
            .get(real)?
            .map(|v| resubst(&v, &self.tables.iresubst)))
    }

    fn contains(&self, key: &str) -> GVarResult<bool> {
        self.env.contains(self.translate(key)?)
    }

    fn items(&self) -> GVarResult<Vec<(String, Value)>> {
        let items = self
            .env
            .items()?
            .into_iter()
            .filter_map(|(key, value)| {
                let key = match self.tables.irename.get(&key) {
                    Some(own) => own.clone(),
                    None if self.strict => return None,
                    None => key,
                };
                Some((key, resubst(&value, &self.tables.iresubst)))
            })
            .collect();
        Ok(items)
    }

    fn subst(&self, template: &str) -> GVarResult<String> {
        self.env.subst(&resubst_str(template, &self.tables.resubst))
    }
}

impl<E: EnvironmentMut> EnvironmentMut for EnvProxy<'_, E> {
    fn set(&mut self, key: &str, value: Value) -> GVarResult<()> {
        let value = resubst(&value, &self.tables.resubst);
        let real = match self.tables.rename.get(key) {
            Some(real) => real.as_str(),
            None if self.strict => {
                return Err(GVarError::UndeclaredKey {
                    key: key.to_string(),
                });
            }
            None => key,
        };
        trace!(key, real, %value, "proxy set");
        self.env.set(real, value)
    }

    fn remove(&mut self, key: &str) -> GVarResult<Option<Value>> {
        let real = match self.tables.rename.get(key) {
            Some(real) => real.as_str(),
            None if self.strict => {
                return Err(GVarError::UndeclaredKey {
                    key: key.to_string(),
                });
            }
            None => key,
        };
        Ok(self
            .env
            .remove(real)?
            .map(|v| resubst(&v, &self.tables.iresubst)))
    }
}
