use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::decls::CommittedDecls;
use crate::errors::{GVarError, GVarResult};
use crate::host::{Environment, EnvironmentMut, OptionRegistry, VariableSource};
use crate::namespace::{Namespace, PerNamespace};
use crate::proxy::{EnvProxy, ProxyTables};
use crate::resubst::{NameTable, compose};

/// Maps values between a build environment and the command line, built from committed
/// declarations.
///
/// For [`Namespace::Var`] and [`Namespace::Opt`] the engine holds tables translating that
/// namespace's keys into ENV keys (a VAR/OPT key whose GVar has no ENV declaration has no
/// translation). For [`Namespace::Env`] it holds the tables translating GVar names into ENV keys,
/// so an ENV proxy addresses the environment by GVar name.
#[derive(Clone, Debug)]
pub struct GVars {
    names: Vec<String>,
    /// GVar name → key, per namespace.
    keys: PerNamespace<NameTable>,
    proxies: PerNamespace<ProxyTables>,
}

impl GVars {
    pub fn new(decls: &CommittedDecls) -> Self {
        let env_rename = decls.rename_table(Namespace::Env);
        let proxies = PerNamespace::from_fn(|ns| match ns {
            Namespace::Env => ProxyTables::new(env_rename.clone()),
            _ => ProxyTables::new(compose(decls.irename_table(ns), env_rename)),
        });

        GVars {
            names: decls.keys().map(String::from).collect(),
            keys: PerNamespace::from_fn(|ns| decls.rename_table(ns).clone()),
            proxies,
        }
    }

    /// GVar names, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The key of GVar `name` in namespace `ns`.
    pub fn key(&self, ns: Namespace, name: &str) -> GVarResult<&str> {
        match self.keys[ns].get(name) {
            Some(key) => Ok(key),
            None if self.names.iter().any(|n| n == name) => {
                Err(GVarError::undeclared_namespace(name, ns))
            }
            None => Err(GVarError::UnknownGVar {
                name: name.to_string(),
            }),
        }
    }

    pub fn env_key(&self, name: &str) -> GVarResult<&str> {
        self.key(Namespace::Env, name)
    }

    pub fn var_key(&self, name: &str) -> GVarResult<&str> {
        self.key(Namespace::Var, name)
    }

    pub fn opt_key(&self, name: &str) -> GVarResult<&str> {
        self.key(Namespace::Opt, name)
    }

    /// Tables of the `ns` view over the environment.
    pub fn proxy_tables(&self, ns: Namespace) -> &ProxyTables {
        &self.proxies[ns]
    }

    /// A view of `env` through the keys of namespace `ns` ([`Namespace::Env`] means GVar names).
    pub fn proxy<E: Environment>(&self, env: E, ns: Namespace, strict: bool) -> EnvProxy<'_, E> {
        EnvProxy::new(env, &self.proxies[ns], strict)
    }

    /// A view of `env` addressed by GVar name.
    pub fn gvar_proxy<E: Environment>(&self, env: E, strict: bool) -> EnvProxy<'_, E> {
        self.proxy(env, Namespace::Env, strict)
    }

    /// A view of `env` addressed by command-line variable name.
    pub fn var_proxy<E: Environment>(&self, env: E, strict: bool) -> EnvProxy<'_, E> {
        self.proxy(env, Namespace::Var, strict)
    }

    /// A view of `env` addressed by option destination.
    pub fn opt_proxy<E: Environment>(&self, env: E, strict: bool) -> EnvProxy<'_, E> {
        self.proxy(env, Namespace::Opt, strict)
    }

    /// Let `variables` write the command-line variables it collected into `env`.
    pub fn update_env_from_vars(
        &self,
        env: &mut dyn EnvironmentMut,
        variables: &dyn VariableSource,
        args: Option<&IndexMap<String, String>>,
    ) -> GVarResult<()> {
        let mut proxy = self.var_proxy(env, false);
        variables.update(&mut proxy, args)
    }

    /// Write the value of every parsed option that maps to an ENV variable into `env`. Options
    /// with no value are skipped.
    pub fn update_env_from_opts(
        &self,
        env: &mut dyn EnvironmentMut,
        options: &dyn OptionRegistry,
    ) -> GVarResult<()> {
        let tables = &self.proxies[Namespace::Opt];
        let mut proxy = self.opt_proxy(env, true);
        for dest in tables.rename().keys() {
            match options.get_option(dest) {
                Some(value) => proxy.set(dest, value)?,
                None => trace!(dest = %dest, "option not set"),
            }
        }
        Ok(())
    }

    /// Apply command-line variables, then options. An option given for the same ENV variable as
    /// a command-line variable wins.
    pub fn update_environment(
        &self,
        env: &mut dyn EnvironmentMut,
        variables: Option<&dyn VariableSource>,
        options: Option<&dyn OptionRegistry>,
        args: Option<&IndexMap<String, String>>,
    ) -> GVarResult<()> {
        if let Some(variables) = variables {
            debug!("updating environment from command-line variables");
            self.update_env_from_vars(env, variables, args)?;
        }
        if let Some(options) = options {
            debug!("updating environment from command-line options");
            self.update_env_from_opts(env, options)?;
        }
        Ok(())
    }

    /// Save the command-line variables of `variables` to `path`, with values read from `env`.
    pub fn save_variables(
        &self,
        variables: &dyn VariableSource,
        path: &Path,
        env: &dyn Environment,
    ) -> GVarResult<()> {
        let proxy = self.var_proxy(env, false);
        variables.save(path, &proxy)
    }

    pub fn generate_variables_help_text(
        &self,
        variables: &dyn VariableSource,
        env: &dyn Environment,
    ) -> GVarResult<String> {
        let proxy = self.var_proxy(env, false);
        variables.generate_help_text(&proxy)
    }
}
