//! GNU installation directory variables, as listed by the GNU Coding Standards: `prefix`,
//! `bindir`, `sysconfdir` and friends, plus `man<S>dir` / `man<S>ext` for every standard man
//! section.
//!
//! Defaults reference each other with `${name}` placeholders, so that after commit
//! `GNUBLD_BINDIR` defaults to `${GNUBLD_EXEC_PREFIX}/bin`. `${package}` and `${install_package}`
//! are not declared here and stay as they are.

use gvars::{GVarDecls, GVarResult, OptKind, UniformDeclBuilder};
use itertools::Itertools;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::defaults::{KeyTransforms, NameFilter};

pub const MAN_SECTIONS: [&str; 12] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "n", "l"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirVar {
    pub name: String,
    pub help: String,
    pub default: String,
}

impl DirVar {
    fn new<N: Into<String>, H: Into<String>, D: Into<String>>(name: N, help: H, default: D) -> Self {
        DirVar {
            name: name.into(),
            help: help.into(),
            default: default.into(),
        }
    }
}

pub static DIR_VARS: Lazy<Vec<DirVar>> = Lazy::new(|| {
    let mut vars = vec![
        DirVar::new("prefix", "Installation prefix", "/usr/local"),
        DirVar::new(
            "exec_prefix",
            "Installation prefix for executable files",
            "${prefix}",
        ),
        DirVar::new(
            "bindir",
            "The directory for installing executable programs that users can run.",
            "${exec_prefix}/bin",
        ),
        DirVar::new(
            "sbindir",
            "The directory for installing executable programs that can be run from the shell, \
             but are only generally useful to system administrators.",
            "${exec_prefix}/sbin",
        ),
        DirVar::new(
            "libexecdir",
            "The directory for installing executable programs to be run by other programs \
             rather than by users.",
            "${exec_prefix}/libexec",
        ),
        DirVar::new(
            "datarootdir",
            "The root of the directory tree for read-only architecture-independent data files.",
            "${prefix}/share",
        ),
        DirVar::new(
            "datadir",
            "The directory for installing idiosyncratic read-only architecture-independent \
             data files for this program.",
            "${datarootdir}",
        ),
        DirVar::new(
            "sysconfdir",
            "The directory for installing read-only data files that pertain to a single \
             machine - that is to say, files for configuring a host.",
            "${prefix}/etc",
        ),
        DirVar::new(
            "sharedstatedir",
            "The directory for installing architecture-independent data files which the \
             programs modify while they run.",
            "${prefix}/com",
        ),
        DirVar::new(
            "localstatedir",
            "The directory for installing data files which the programs modify while they \
             run, and that pertain to one specific machine.",
            "${prefix}/var",
        ),
        DirVar::new(
            "includedir",
            "The directory for installing header files to be included by user programs with \
             the C \"#include\" preprocessor directive.",
            "${prefix}/include",
        ),
        DirVar::new(
            "oldincludedir",
            "The directory for installing \"#include\" header files for use with compilers \
             other than GCC.",
            "/usr/include",
        ),
        DirVar::new(
            "docdir",
            "The directory for installing documentation files (other than Info) for this \
             package.",
            "${datarootdir}/doc/${install_package}",
        ),
        DirVar::new(
            "infodir",
            "The directory for installing the Info files for this package.",
            "${datarootdir}/info",
        ),
        DirVar::new(
            "htmldir",
            "Directory for installing documentation files in the html format.",
            "${docdir}",
        ),
        DirVar::new(
            "dvidir",
            "Directory for installing documentation files in the dvi format.",
            "${docdir}",
        ),
        DirVar::new(
            "pdfdir",
            "Directory for installing documentation files in the pdf format.",
            "${docdir}",
        ),
        DirVar::new(
            "psdir",
            "Directory for installing documentation files in the ps format.",
            "${docdir}",
        ),
        DirVar::new(
            "libdir",
            "The directory for object files and libraries of object code.",
            "${exec_prefix}/lib",
        ),
        DirVar::new(
            "lispdir",
            "The directory for installing any Emacs Lisp files in this package.",
            "${datarootdir}/emacs/site-lisp",
        ),
        DirVar::new(
            "localedir",
            "The directory for installing locale-specific message catalogs for this package.",
            "${datarootdir}/locale",
        ),
        DirVar::new(
            "mandir",
            "The top-level directory for installing the man pages (if any) for this package.",
            "${datarootdir}/man",
        ),
        DirVar::new(
            "pkgdatadir",
            "The directory for installing idiosyncratic read-only architecture-independent \
             data files for this program.",
            "${datadir}/${package}",
        ),
        DirVar::new(
            "pkgincludedir",
            "The directory for installing header files to be included by user programs with \
             the C \"#include\" preprocessor directive.",
            "${includedir}/${package}",
        ),
        DirVar::new(
            "pkglibdir",
            "The directory for object files and libraries of object code.",
            "${libdir}/${package}",
        ),
        DirVar::new(
            "pkglibexecdir",
            "The directory for installing executable programs to be run by other programs \
             rather than by users.",
            "${libexecdir}/${package}",
        ),
    ];

    for section in MAN_SECTIONS {
        vars.push(DirVar::new(
            format!("man{section}dir"),
            "",
            format!("${{prefix}}/man/man{section}"),
        ));
        vars.push(DirVar::new(
            format!("man{section}ext"),
            "",
            format!(".{section}"),
        ));
    }

    vars
});

/// Names of the directory variables selected by `filter`, in table order.
pub fn gvar_names(filter: &NameFilter) -> Vec<&'static str> {
    DIR_VARS
        .iter()
        .filter(|dir| filter.matches(&dir.name))
        .map(|dir| dir.name.as_str())
        .collect()
}

/// Declare every directory variable selected by `filter` in all three namespaces. Options are
/// string-typed, take one argument and show `DIR` as their metavar.
pub fn declare_gvars(filter: &NameFilter, transforms: &KeyTransforms) -> GVarResult<GVarDecls> {
    let decls = DIR_VARS
        .iter()
        .filter(|dir| filter.matches(&dir.name))
        .map(|dir| {
            let decl = <UniformDeclBuilder as Default>::default()
                .env_key(transforms.env_key(&dir.name))
                .var_key(transforms.var_key(&dir.name))
                .opt_key(transforms.opt_key(&dir.name))
                .option(transforms.option(&dir.name))
                .default(dir.default.as_str())
                .help(dir.help.as_str())
                .kind(OptKind::String)
                .nargs(1usize)
                .metavar("DIR")
                .decl()?;
            Ok((dir.name.clone(), decl))
        })
        .collect::<GVarResult<Vec<_>>>()?;

    debug!(
        count = decls.len(),
        names = %decls.iter().map(|(name, _)| name).join(","),
        "declaring directory variables"
    );
    GVarDecls::from_decls(decls)
}

#[cfg(test)]
mod test {
    use gvars::{Environment, Namespace, Targets, Value};
    use pretty_assertions::assert_eq;

    use crate::defaults::{KeyTransforms, NameFilter};
    use crate::env::BuildEnv;
    use crate::gnu_dirs::{DIR_VARS, declare_gvars, gvar_names};
    use crate::options::Options;

    #[test]
    fn names() {
        let names = gvar_names(&NameFilter::All);
        assert_eq!(names.len(), 26 + 2 * 12);
        assert_eq!(names[..3], ["prefix", "exec_prefix", "bindir"]);
        assert!(names.contains(&"mannext"));
        assert!(names.contains(&"man1dir"));

        assert_eq!(
            gvar_names(&NameFilter::only(["bindir", "prefix", "nonsense"])),
            vec!["prefix", "bindir"]
        );
        assert_eq!(
            gvar_names(&NameFilter::except(gvar_names(&NameFilter::All).into_iter().skip(1))),
            vec!["prefix"]
        );
    }

    #[test]
    fn man_sections() {
        let man3 = DIR_VARS.iter().find(|d| d.name == "man3dir").unwrap();
        assert_eq!(man3.default, "${prefix}/man/man3");
        assert_eq!(man3.help, "");
        let manl = DIR_VARS.iter().find(|d| d.name == "manlext").unwrap();
        assert_eq!(manl.default, ".l");
    }

    #[test_log::test]
    fn declarations() {
        let decls = declare_gvars(&NameFilter::All, &KeyTransforms::default()).unwrap();
        assert_eq!(decls.len(), DIR_VARS.len());
        assert_eq!(decls.key("exec_prefix", Namespace::Env).unwrap(), "GNUBLD_EXEC_PREFIX");
        assert_eq!(decls.key("exec_prefix", Namespace::Var).unwrap(), "EXEC_PREFIX");
        assert_eq!(decls.key("exec_prefix", Namespace::Opt).unwrap(), "gnubld_exec_prefix");

        let opt = decls.get("exec_prefix").unwrap().opt().unwrap();
        assert_eq!(opt.names(), ["--exec-prefix"]);
        assert_eq!(opt.params().metavar.as_deref(), Some("DIR"));
        assert_eq!(opt.params().nargs(), 1);
    }

    #[test]
    fn committed_defaults() {
        let decls = declare_gvars(
            &NameFilter::only(["prefix", "exec_prefix", "bindir", "docdir"]),
            &KeyTransforms::default(),
        )
        .unwrap();

        let mut env = BuildEnv::new();
        let mut options = Options::new();
        decls
            .commit(Targets::new().env(&mut env).options(&mut options))
            .unwrap();

        assert_eq!(
            env.get("GNUBLD_BINDIR").unwrap(),
            Some(Value::from("${GNUBLD_EXEC_PREFIX}/bin"))
        );
        assert_eq!(env.subst("$GNUBLD_BINDIR").unwrap(), "/usr/local/bin");
        // docdir refers to variables that are not GVars
        assert_eq!(
            env.get("GNUBLD_DOCDIR").unwrap(),
            Some(Value::from("${datarootdir}/doc/${install_package}"))
        );
        assert_eq!(
            options.dests().collect::<Vec<_>>(),
            vec!["gnubld_prefix", "gnubld_exec_prefix", "gnubld_bindir", "gnubld_docdir"]
        );
    }
}
