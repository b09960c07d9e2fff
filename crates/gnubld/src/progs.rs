//! Helper programs a GNU build may need (`AWK`, `INSTALL`, `YACC`, ...). They have no
//! defaults and no command-line options: set them in the environment or as `NAME=value`.

use gvars::{GVarDecls, GVarResult, UniformDeclBuilder};
use tracing::debug;

use crate::defaults::{KeyTransforms, NameFilter};

pub const PROG_VARS: [(&str, &str); 16] = [
    ("AWK", "The awk program to use"),
    ("EGREP", "A grep that accepts extended regular expressions"),
    ("FGREP", "A grep that matches fixed strings"),
    ("GREP", "The grep program to use"),
    ("INSTALL", "A BSD-compatible install program"),
    ("INSTALL_DATA", "Command used to install data files"),
    ("INSTALL_PROGRAM", "Command used to install programs"),
    ("INSTALL_SCRIPT", "Command used to install scripts"),
    ("LEX", "The lexical analyzer generator to use"),
    ("LEX_OUTPUT_ROOT", "Base name of the file the lexer generator writes"),
    ("LEXLIB", "Library to link lexer-generated code with"),
    ("LN_S", "Command that makes a symbolic link, or a copy where links are unsupported"),
    ("MKDIR_P", "Command that creates a directory along with its parents"),
    ("RANLIB", "The program that indexes static libraries"),
    ("SED", "The sed program to use"),
    ("YACC", "The parser generator to use"),
];

pub fn gvar_names(filter: &NameFilter) -> Vec<&'static str> {
    PROG_VARS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| filter.matches(name))
        .collect()
}

pub fn declare_gvars(filter: &NameFilter, transforms: &KeyTransforms) -> GVarResult<GVarDecls> {
    let decls = PROG_VARS
        .iter()
        .filter(|(name, _)| filter.matches(name))
        .map(|(name, help)| {
            let decl = <UniformDeclBuilder as Default>::default()
                .env_key(transforms.env_key(name))
                .var_key(transforms.var_key(name))
                .help(*help)
                .decl()?;
            Ok((*name, decl))
        })
        .collect::<GVarResult<Vec<_>>>()?;

    debug!(count = decls.len(), "declaring program variables");
    GVarDecls::from_decls(decls)
}
