//! C/C++ compiler and linker variables.

use gvars::{Converter, GVarDecls, GVarResult, UniformDeclBuilder, Value};
use gvars_util::split::split_filter_empty;
use indexmap::IndexMap;
use tracing::debug;

use crate::defaults::{KeyTransforms, NameFilter};

/// Programs. Their default is left to the host (autodetection is not done here).
pub const PROG_VARS: [(&str, &str); 3] = [
    ("CC", "A C compiler to use"),
    ("CXX", "A C++ compiler to use"),
    ("LINK", "A linker to use"),
];

/// Flag lists. They default to an empty list.
pub const FLAG_VARS: [(&str, &str); 4] = [
    ("CFLAGS", "Flags for C compiler"),
    ("CXXFLAGS", "Flags for C++ compiler"),
    ("CCFLAGS", "Flags for both C and C++ compilers"),
    ("LINKFLAGS", "Flags for linker"),
];

/// Split a flags string into a list, leaving lists alone.
pub fn flag_converter() -> Converter {
    Converter::new(|value| {
        Ok(match value {
            Value::List(_) => value.clone(),
            other => Value::List(
                split_filter_empty(&other.render(), " ")
                    .map(String::from)
                    .collect(),
            ),
        })
    })
}

pub fn gvar_names(filter: &NameFilter) -> Vec<&'static str> {
    PROG_VARS
        .iter()
        .chain(FLAG_VARS.iter())
        .map(|(name, _)| *name)
        .filter(|name| filter.matches(name))
        .collect()
}

/// Declare the selected compiler variables in ENV and VAR. `defaults` overrides the built-in
/// default of any variable it names.
pub fn declare_gvars(
    defaults: &IndexMap<String, Value>,
    filter: &NameFilter,
    transforms: &KeyTransforms,
) -> GVarResult<GVarDecls> {
    let mut decls = vec![];

    for (name, help) in PROG_VARS.iter().filter(|(name, _)| filter.matches(name)) {
        let mut builder = <UniformDeclBuilder as Default>::default();
        builder
            .env_key(transforms.env_key(name))
            .var_key(transforms.var_key(name))
            .help(*help);
        if let Some(default) = defaults.get(*name) {
            builder.default(default.clone());
        }
        decls.push((*name, builder.decl()?));
    }

    for (name, help) in FLAG_VARS.iter().filter(|(name, _)| filter.matches(name)) {
        let default = defaults
            .get(*name)
            .cloned()
            .unwrap_or_else(|| Value::List(vec![]));
        let decl = <UniformDeclBuilder as Default>::default()
            .env_key(transforms.env_key(name))
            .var_key(transforms.var_key(name))
            .help(*help)
            .default(default)
            .converter(flag_converter())
            .decl()?;
        decls.push((*name, decl));
    }

    debug!(count = decls.len(), "declaring compiler variables");
    GVarDecls::from_decls(decls)
}
