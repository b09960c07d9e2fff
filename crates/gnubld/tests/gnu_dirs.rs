use std::path::Path;

use gnubld::defaults::{KeyTransforms, NameFilter};
use gnubld::env::BuildEnv;
use gnubld::gnu_dirs::declare_gvars;
use gnubld::options::Options;
use gnubld::variables::Variables;
use gvars::{Environment, GVars, Targets, Value};
use pretty_assertions::assert_eq;

struct Build {
    env: BuildEnv,
    variables: Variables,
    options: Options,
    gvars: GVars,
}

impl Build {
    fn new(vars_file: Option<&Path>) -> Self {
        let decls = declare_gvars(
            &NameFilter::only(["prefix", "exec_prefix", "bindir"]),
            &KeyTransforms::default(),
        )
        .unwrap();

        let mut env = BuildEnv::new();
        let mut variables = Variables::new();
        if let Some(path) = vars_file {
            variables = variables.with_file(path);
        }
        let mut options = Options::new();
        let committed = decls
            .commit(
                Targets::new()
                    .env(&mut env)
                    .variables(&mut variables)
                    .options(&mut options),
            )
            .unwrap();

        Build {
            env,
            variables,
            options,
            gvars: committed.gvars(),
        }
    }

    fn run(&mut self, args: &[&str]) {
        let rest = self.variables.collect_args(args);
        let rest = self.options.parse(rest.as_slice()).unwrap();
        assert!(rest.is_empty(), "leftover arguments: {rest:?}");
        self.gvars
            .update_environment(&mut self.env, Some(&self.variables), Some(&self.options), None)
            .unwrap();
    }

    fn subst(&self, key: &str) -> String {
        self.env.subst(&format!("${{{key}}}")).unwrap()
    }
}

#[test_log::test]
fn defaults_follow_each_other() {
    let mut build = Build::new(None);
    assert_eq!(
        build.env.get("GNUBLD_EXEC_PREFIX").unwrap(),
        Some(Value::from("${GNUBLD_PREFIX}"))
    );

    build.run(&["PREFIX=/opt"]);
    assert_eq!(build.subst("GNUBLD_PREFIX"), "/opt");
    assert_eq!(build.subst("GNUBLD_BINDIR"), "/opt/bin");

    let proxy = build.gvars.gvar_proxy(&build.env, true);
    assert_eq!(
        proxy.get("bindir").unwrap(),
        Some(Value::from("${exec_prefix}/bin"))
    );
    assert_eq!(proxy.subst("$bindir").unwrap(), "/opt/bin");
    assert!(proxy.get("GNUBLD_BINDIR").is_err());
}

#[test_log::test]
fn options_override_variables() {
    let mut build = Build::new(None);
    build.run(&["PREFIX=/a", "--prefix=/b", "--exec-prefix", "/c"]);
    assert_eq!(build.subst("GNUBLD_PREFIX"), "/b");
    assert_eq!(build.subst("GNUBLD_BINDIR"), "/c/bin");
}

#[test_log::test]
fn save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gnubld.vars");

    let mut build = Build::new(None);
    build.run(&["PREFIX=/opt", "--bindir=/usr/bin"]);
    build
        .gvars
        .save_variables(&build.variables, &path, &build.env)
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "PREFIX = \"/opt\"\nBINDIR = \"/usr/bin\"\n"
    );

    let mut reloaded = Build::new(Some(&path));
    reloaded.run(&[]);
    assert_eq!(reloaded.subst("GNUBLD_PREFIX"), "/opt");
    assert_eq!(reloaded.subst("GNUBLD_EXEC_PREFIX"), "/opt");
    assert_eq!(reloaded.subst("GNUBLD_BINDIR"), "/usr/bin");

    // command-line assignments still win over the file
    let mut overridden = Build::new(Some(&path));
    overridden.run(&["BINDIR=/x"]);
    assert_eq!(overridden.subst("GNUBLD_BINDIR"), "/x");
}

#[test]
fn help_texts() {
    let mut build = Build::new(None);
    build.run(&["PREFIX=/opt"]);

    let help = build
        .gvars
        .generate_variables_help_text(&build.variables, &build.env)
        .unwrap();
    assert!(help.starts_with(
        "\nPREFIX: Installation prefix\n    default: /usr/local\n    actual: /opt\n"
    ));
    assert!(help.contains("\nBINDIR: "));
    assert!(help.contains("    default: ${EXEC_PREFIX}/bin\n    actual: /opt/bin\n"));

    let options = build.options.format_help();
    assert!(options.starts_with("Options:\n"));
    assert!(options.contains("--prefix <DIR>"));
    assert!(options.contains("--exec-prefix <DIR>"));
}
