use std::cell::RefCell;
use std::collections::HashSet;

use gvars::{Environment, EnvironmentMut, GVarError, GVarResult, Value};
use gvars_util::split::replace_all;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scopeguard::{ScopeGuard, defer, guard};

static SUBST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\})")
        .unwrap()
});

#[derive(Clone, Debug, Default)]
struct ExpansionState {
    visited: HashSet<String>,
}

/// In-memory construction environment.
#[derive(Clone, Debug, Default)]
pub struct BuildEnv {
    vars: IndexMap<String, Value>,
    expand_state: RefCell<Option<ExpansionState>>,
}

impl BuildEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Interpolate `$NAME` / `${NAME}` in `value`, recursively. Undefined variables expand to
    /// nothing and `$$` yields a literal `$`.
    pub fn expand<S: AsRef<str>>(&self, value: S) -> GVarResult<String> {
        let value = value.as_ref();
        if !value.contains('$') {
            return Ok(value.to_string());
        }

        // The outermost call owns the expansion state and clears it on the way out.
        let scope = guard((), |()| {
            RefCell::borrow_mut(&self.expand_state).take();
        });
        {
            let mut s = RefCell::borrow_mut(&self.expand_state);
            if s.is_none() {
                *s = Some(ExpansionState::default());
            } else {
                ScopeGuard::into_inner(scope);
            }
        }

        replace_all(&SUBST_REGEX, value, |caps: &Captures| -> GVarResult<String> {
            if caps.name("escaped").is_some() {
                return Ok("$".to_string());
            }
            let Some(name) = caps.name("named").or_else(|| caps.name("braced")) else {
                return Ok(caps[0].to_string());
            };
            let name = name.as_str();

            {
                let mut s = RefCell::borrow_mut(&self.expand_state);
                if let Some(state) = s.as_mut() {
                    if !state.visited.insert(name.to_string()) {
                        return Err(GVarError::RecursiveReference {
                            var: name.to_string(),
                        });
                    }
                }
            }

            defer! {
                if let Some(state) = RefCell::borrow_mut(&self.expand_state).as_mut() {
                    state.visited.remove(name);
                }
            }

            match self.vars.get(name) {
                Some(v) => self.expand(v.render()),
                None => Ok(String::new()),
            }
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for BuildEnv {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        BuildEnv {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            expand_state: RefCell::new(None),
        }
    }
}

impl Environment for BuildEnv {
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
        self.expand(template)
    }
}

impl EnvironmentMut for BuildEnv {
    fn set(&mut self, key: &str, value: Value) -> GVarResult<()> {
        self.vars.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GVarResult<Option<Value>> {
        Ok(self.vars.shift_remove(key))
    }
}
