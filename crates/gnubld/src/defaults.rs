use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use indexmap::IndexSet;

pub const ENV_KEY_PREFIX: &str = "GNUBLD_";
pub const OPT_KEY_PREFIX: &str = "gnubld_";
pub const OPTION_PREFIX: &str = "--";

type Transform = Rc<dyn Fn(&str) -> String>;

/// Derives the per-namespace keys (and the option string) of a GVar from its name.
#[derive(Clone)]
pub struct KeyTransforms {
    env_key: Transform,
    var_key: Transform,
    opt_key: Transform,
    option: Transform,
}

impl Default for KeyTransforms {
    /// `prefix` becomes `GNUBLD_PREFIX`, `PREFIX`, `gnubld_prefix` and `--prefix`.
    fn default() -> Self {
        KeyTransforms {
            env_key: Rc::new(|name| format!("{ENV_KEY_PREFIX}{}", name.to_uppercase())),
            var_key: Rc::new(|name| name.to_uppercase()),
            opt_key: Rc::new(|name| format!("{OPT_KEY_PREFIX}{}", name.to_lowercase())),
            option: Rc::new(|name| format!("{OPTION_PREFIX}{}", name.to_lowercase().replace('_', "-"))),
        }
    }
}

impl Debug for KeyTransforms {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTransforms").finish_non_exhaustive()
    }
}

impl KeyTransforms {
    pub fn with_env_key(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.env_key = Rc::new(f);
        self
    }

    pub fn with_var_key(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.var_key = Rc::new(f);
        self
    }

    pub fn with_opt_key(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.opt_key = Rc::new(f);
        self
    }

    pub fn with_option(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.option = Rc::new(f);
        self
    }

    pub fn env_key(&self, name: &str) -> String {
        (self.env_key)(name)
    }

    pub fn var_key(&self, name: &str) -> String {
        (self.var_key)(name)
    }

    pub fn opt_key(&self, name: &str) -> String {
        (self.opt_key)(name)
    }

    pub fn option(&self, name: &str) -> String {
        (self.option)(name)
    }
}

/// Selects which entries of a table become GVars.
#[derive(Clone, Debug, Default)]
pub enum NameFilter {
    #[default]
    All,
    Only(IndexSet<String>),
    Except(IndexSet<String>),
}

impl NameFilter {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameFilter::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameFilter::Except(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Only(names) => names.contains(name),
            NameFilter::Except(names) => !names.contains(name),
        }
    }
}
