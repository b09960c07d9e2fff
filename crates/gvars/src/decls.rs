//! The set of all GVar declarations of a build, and its open → committed lifecycle.
//!
//! [`GVarDecls`] is the open set: declarations can be added, removed and rekeyed. Committing it
//! consumes it and yields a [`CommittedDecls`], which has no mutators, so nothing can alter a set
//! once its declarations have been materialized.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::decl::{GVarDecl, Target};
use crate::engine::GVars;
use crate::errors::{GVarError, GVarResult};
use crate::host::{EnvironmentMut, OptionRegistry, VariableSource};
use crate::namespace::{Namespace, PerNamespace};
use crate::resubst::{NameTable, build_iresubst_table, build_resubst_table, resubst_opt};
use crate::uniform::UniformDecl;
use crate::value::Value;

/// Where [`GVarDecls::commit`] materializes declarations. Every target is optional.
#[derive(Default)]
pub struct Targets<'a> {
    env: Option<&'a mut dyn EnvironmentMut>,
    variables: Option<&'a mut dyn VariableSource>,
    options: Option<&'a mut dyn OptionRegistry>,
}

impl<'a> Targets<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self, env: &'a mut dyn EnvironmentMut) -> Self {
        self.env = Some(env);
        self
    }

    pub fn variables(mut self, variables: &'a mut dyn VariableSource) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn options(mut self, options: &'a mut dyn OptionRegistry) -> Self {
        self.options = Some(options);
        self
    }

    fn is_empty(&self) -> bool {
        self.env.is_none() && self.variables.is_none() && self.options.is_none()
    }
}

/// Materialize every declaration into whichever targets are present.
fn materialize<'d>(
    decls: impl Iterator<Item = (&'d String, &'d GVarDecl)>,
    targets: &mut Targets<'_>,
) -> GVarResult<()> {
    for (name, decl) in decls {
        if let Some(env) = targets.env.as_deref_mut() {
            decl.safe_add_to(Target::Env(env))?;
        }
        if let Some(variables) = targets.variables.as_deref_mut() {
            decl.safe_add_to(Target::Variables(variables))?;
        }
        if let Some(options) = targets.options.as_deref_mut() {
            decl.safe_add_to(Target::Options(options))?;
        }
        trace!(name = %name, "materialized");
    }
    Ok(())
}

/// Open set of GVar declarations, keyed by GVar name.
///
/// Besides the declarations themselves, the set keeps two lookup tables per namespace: `rename`
/// (GVar name → key) and `irename` (key → GVar name). No two GVars may share a key within one
/// namespace.
#[derive(Clone, Debug, Default)]
pub struct GVarDecls {
    decls: IndexMap<String, GVarDecl>,
    rename: PerNamespace<NameTable>,
    irename: PerNamespace<NameTable>,
}

impl GVarDecls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(name, declaration)` pairs. Fails on the first key collision.
    pub fn from_decls<N, I>(decls: I) -> GVarResult<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, GVarDecl)>,
    {
        let mut ret = GVarDecls::new();
        ret.update(decls)?;
        Ok(ret)
    }

    pub fn from_uniform<N, I>(decls: I) -> GVarResult<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, UniformDecl)>,
    {
        let mut ret = GVarDecls::new();
        for (name, decl) in decls {
            ret.insert(name, decl.into_decl()?)?;
        }
        Ok(ret)
    }

    fn check_collisions(&self, name: &str, decl: &GVarDecl) -> GVarResult<()> {
        for ns in decl.namespaces() {
            let key = decl.key(ns)?;
            if let Some(existing) = self.irename[ns].get(key) {
                if existing != name {
                    return Err(GVarError::DuplicateKey {
                        namespace: ns,
                        key: key.to_string(),
                        existing: existing.clone(),
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn unregister(&mut self, name: &str) {
        for ns in Namespace::ALL {
            if let Some(key) = self.rename[ns].shift_remove(name) {
                self.irename[ns].shift_remove(&key);
            }
        }
    }

    fn register(&mut self, name: &str, decl: &GVarDecl) -> GVarResult<()> {
        for ns in decl.namespaces() {
            let key = decl.key(ns)?.to_string();
            self.rename[ns].insert(name.to_string(), key.clone());
            self.irename[ns].insert(key, name.to_string());
        }
        Ok(())
    }

    /// Add (or replace) the declaration of GVar `name`.
    ///
    /// Fails with [`GVarError::DuplicateKey`] if one of its keys already belongs to another GVar,
    /// in which case the set is left as it was.
    pub fn insert<N: Into<String>>(&mut self, name: N, decl: GVarDecl) -> GVarResult<()> {
        let name = name.into();
        self.check_collisions(&name, &decl)?;

        self.unregister(&name);
        self.register(&name, &decl)?;
        trace!(name = %name, "declared");
        self.decls.insert(name, decl);
        Ok(())
    }

    /// Insert every pair, all or nothing.
    pub fn update<N, I>(&mut self, decls: I) -> GVarResult<()>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, GVarDecl)>,
    {
        let mut staged = self.clone();
        for (name, decl) in decls {
            staged.insert(name, decl)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<GVarDecl> {
        let decl = self.decls.shift_remove(name)?;
        self.unregister(name);
        Some(decl)
    }

    /// Change the key GVar `name` uses in namespace `ns`.
    pub fn set_key<K: Into<String>>(&mut self, name: &str, ns: Namespace, key: K) -> GVarResult<()> {
        let key = key.into();
        let decl = self
            .decls
            .get_mut(name)
            .ok_or_else(|| GVarError::UnknownGVar {
                name: name.to_string(),
            })?;
        if let Some(existing) = self.irename[ns].get(&key) {
            if existing != name {
                return Err(GVarError::DuplicateKey {
                    namespace: ns,
                    key,
                    existing: existing.clone(),
                    name: name.to_string(),
                });
            }
        }

        let old = decl
            .key(ns)
            .map_err(|_| GVarError::undeclared_namespace(name, ns))?
            .to_string();
        decl.set_key(ns, key.clone())?;

        self.irename[ns].shift_remove(&old);
        self.irename[ns].insert(key.clone(), name.to_string());
        self.rename[ns].insert(name.to_string(), key);
        Ok(())
    }

    pub fn set_default(&mut self, name: &str, ns: Namespace, default: Option<Value>) -> GVarResult<()> {
        self.decls
            .get_mut(name)
            .ok_or_else(|| GVarError::UnknownGVar {
                name: name.to_string(),
            })?
            .set_default(ns, default)
            .map_err(|_| GVarError::undeclared_namespace(name, ns))
    }

    pub fn get(&self, name: &str) -> Option<&GVarDecl> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GVarDecl)> {
        self.decls.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// The key GVar `name` has in namespace `ns`.
    pub fn key(&self, name: &str, ns: Namespace) -> GVarResult<&str> {
        self.rename[ns]
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| self.lookup_error(name, ns))
    }

    fn lookup_error(&self, name: &str, ns: Namespace) -> GVarError {
        if self.decls.contains_key(name) {
            GVarError::undeclared_namespace(name, ns)
        } else {
            GVarError::UnknownGVar {
                name: name.to_string(),
            }
        }
    }

    /// GVar name → key, for namespace `ns`.
    pub fn rename_table(&self, ns: Namespace) -> &NameTable {
        &self.rename[ns]
    }

    /// Key → GVar name, for namespace `ns`.
    pub fn irename_table(&self, ns: Namespace) -> &NameTable {
        &self.irename[ns]
    }

    /// Finalize the set.
    ///
    /// Builds the placeholder tables, rewrites every default so `$name` placeholders refer to the
    /// key of GVar `name` in the default's own namespace, then materializes every declaration
    /// into each of `targets`.
    pub fn commit(mut self, targets: Targets<'_>) -> GVarResult<CommittedDecls> {
        let resubst = PerNamespace::from_fn(|ns| build_resubst_table(&self.rename[ns]));
        let iresubst = PerNamespace::from_fn(|ns| build_iresubst_table(&self.rename[ns]));

        for decl in self.decls.values_mut() {
            for ns in Namespace::ALL {
                if let Ok(default) = decl.default(ns) {
                    let rewritten = resubst_opt(default, &resubst[ns]);
                    decl.set_default(ns, rewritten)?;
                }
            }
        }

        debug!(gvars = self.decls.len(), "committing declarations");

        let committed = CommittedDecls {
            decls: self,
            resubst,
            iresubst,
        };
        committed.add_to(targets)?;
        Ok(committed)
    }
}

/// A committed, read-only set of GVar declarations.
#[derive(Clone, Debug)]
pub struct CommittedDecls {
    decls: GVarDecls,
    resubst: PerNamespace<NameTable>,
    iresubst: PerNamespace<NameTable>,
}

impl CommittedDecls {
    /// Committing again does nothing; `targets` are not touched.
    pub fn commit(self, targets: Targets<'_>) -> GVarResult<CommittedDecls> {
        if !targets.is_empty() {
            debug!("declarations already committed, not materializing again");
        }
        Ok(self)
    }

    /// Materialize every declaration into each of `targets`.
    pub fn add_to(&self, mut targets: Targets<'_>) -> GVarResult<()> {
        materialize(self.decls.decls.iter(), &mut targets)
    }

    pub fn get(&self, name: &str) -> Option<&GVarDecl> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.decls.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GVarDecl)> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn key(&self, name: &str, ns: Namespace) -> GVarResult<&str> {
        self.decls.key(name, ns)
    }

    pub fn rename_table(&self, ns: Namespace) -> &NameTable {
        self.decls.rename_table(ns)
    }

    pub fn irename_table(&self, ns: Namespace) -> &NameTable {
        self.decls.irename_table(ns)
    }

    /// GVar name → `${key}`, for namespace `ns`.
    pub fn resubst_table(&self, ns: Namespace) -> &NameTable {
        &self.resubst[ns]
    }

    /// Key → `${name}`, for namespace `ns`.
    pub fn iresubst_table(&self, ns: Namespace) -> &NameTable {
        &self.iresubst[ns]
    }

    /// Build the engine that maps between the namespaces of this set.
    pub fn gvars(&self) -> GVars {
        GVars::new(self)
    }
}
