//!
//! ## Introduction
//! This crate keeps build configuration variables consistent across the three places a user can
//! set them: the construction environment, `NAME=value` command-line variables, and
//! `--name=value` command-line options.
//!
//! ## Terminology
//!
//! ### GVars and namespaces
//! A **GVar** is one logical variable, identified by its **name**. It may be declared in any of
//! three **namespaces** (see [`Namespace`]):
//!
//! - `ENV`: a construction variable, `env["GNUBLD_PREFIX"]`
//! - `VAR`: a command-line variable, `PREFIX=/usr`
//! - `OPT`: a command-line option, `--prefix=/usr`, keyed by its destination (`gnubld_prefix`)
//!
//! Each namespace has its own **key** for the GVar. In the example above, GVar `prefix` has keys
//! `GNUBLD_PREFIX`, `PREFIX` and `gnubld_prefix`.
//!
//! ### Placeholders
//! String values may reference other variables with `$NAME` or `${NAME}` placeholders. Whenever a
//! value crosses from one namespace to another, its placeholders are rewritten as well, so
//!
//! ```text
//! bindir = "${exec_prefix}/bin"
//! ```
//!
//! is stored in the environment as `${GNUBLD_EXEC_PREFIX}/bin`, read back through a VAR view as
//! `${EXEC_PREFIX}/bin`, and so on. Placeholders naming something the tables don't know are kept
//! verbatim; they may refer to a variable that is not a GVar at all. `$$` is kept as is.
//!
//! ### Lifecycle
//! 1. Declarations are collected in a [`GVarDecls`], either as [`GVarDecl`]s or as flat
//!    [`UniformDecl`]s.
//! 2. [`GVarDecls::commit`] rewrites the defaults and creates the declared variables in the
//!    environment, the command-line variable source and the option registry. The result is a
//!    [`CommittedDecls`], which cannot be modified.
//! 3. [`CommittedDecls::gvars`] builds the [`GVars`] engine, which copies command-line values into
//!    the environment ([`GVars::update_environment`]) and hands out namespace views
//!    ([`EnvProxy`]) of it.
//!
//! ```
//! use gvars::{GVarDecl, GVarDecls, Namespace, Targets, Value};
//! # use gvars::{Environment, EnvironmentMut, GVarResult};
//! # use indexmap::IndexMap;
//! # #[derive(Default)]
//! # struct Env(IndexMap<String, Value>);
//! # impl Environment for Env {
//! #     fn get(&self, key: &str) -> GVarResult<Option<Value>> { Ok(self.0.get(key).cloned()) }
//! #     fn contains(&self, key: &str) -> GVarResult<bool> { Ok(self.0.contains_key(key)) }
//! #     fn items(&self) -> GVarResult<Vec<(String, Value)>> {
//! #         Ok(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
//! #     }
//! #     fn subst(&self, template: &str) -> GVarResult<String> { Ok(template.to_string()) }
//! # }
//! # impl EnvironmentMut for Env {
//! #     fn set(&mut self, key: &str, value: Value) -> GVarResult<()> {
//! #         self.0.insert(key.to_string(), value);
//! #         Ok(())
//! #     }
//! #     fn remove(&mut self, key: &str) -> GVarResult<Option<Value>> { Ok(self.0.shift_remove(key)) }
//! # }
//! let mut decls = GVarDecls::new();
//! decls.insert("prefix", <GVarDecl as Default>::default().with_env(("GNUBLD_PREFIX", "/usr/local"))?)?;
//! decls.insert("bindir", <GVarDecl as Default>::default().with_env(("GNUBLD_BINDIR", "${prefix}/bin"))?)?;
//!
//! let mut env = Env::default();
//! let committed = decls.commit(Targets::new().env(&mut env))?;
//! assert_eq!(env.get("GNUBLD_BINDIR")?, Some(Value::from("${GNUBLD_PREFIX}/bin")));
//!
//! let gvars = committed.gvars();
//! let view = gvars.proxy(&env, Namespace::Env, true);
//! assert_eq!(view.get("bindir")?, Some(Value::from("${prefix}/bin")));
//! # Ok::<(), gvars::GVarError>(())
//! ```

pub mod decl;
pub mod decls;
pub mod engine;
pub mod errors;
pub mod host;
pub mod namespace;
pub mod proxy;
pub mod resubst;
pub mod uniform;
pub mod value;

#[cfg(test)]
mod tests;

pub use decl::{
    Callback, CallbackInvocation, Converter, EnvDecl, EnvDeclInput, GVarDecl, OptAction, OptDecl,
    OptDeclInput, OptKind, OptParams, OptParamsBuilder, Target, Validator, VarDecl, VarDeclInput,
};
pub use decls::{CommittedDecls, GVarDecls, Targets};
pub use engine::GVars;
pub use errors::{GVarError, GVarResult};
pub use host::{Environment, EnvironmentMut, OptionRegistry, VariableSource};
pub use namespace::{Namespace, PerNamespace};
pub use proxy::{EnvProxy, ProxyTables};
pub use uniform::{UniformDecl, UniformDeclBuilder};
pub use value::Value;
