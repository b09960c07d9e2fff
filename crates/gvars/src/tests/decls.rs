use maplit::hashmap;
use pretty_assertions::assert_eq;

use crate::decl::{GVarDecl, OptParamsBuilder};
use crate::decls::{GVarDecls, Targets};
use crate::errors::GVarError;
use crate::host::Environment;
use crate::namespace::Namespace;
use crate::resubst::NameTable;
use crate::tests::{TestEnv, TestOptions, TestVariables};
use crate::uniform::UniformDeclBuilder;
use crate::value::Value;

fn table(items: &[(&str, &str)]) -> NameTable {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn foo() -> GVarDecl {
    <GVarDecl as Default>::default()
        .with_env(("ENV_FOO", "A"))
        .unwrap()
        .with_var(("FOO", "foo help"))
        .unwrap()
}

fn bar() -> GVarDecl {
    <GVarDecl as Default>::default()
        .with_env(("ENV_BAR", "${foo}"))
        .unwrap()
        .with_var(("BAR", "bar help", "${foo}"))
        .unwrap()
}

#[test_log::test]
fn commit_rewrites_defaults() {
    let mut decls = GVarDecls::new();
    decls.insert("foo", foo()).unwrap();
    decls.insert("bar", bar()).unwrap();

    let mut env = TestEnv::default();
    let committed = decls.commit(Targets::new().env(&mut env)).unwrap();

    assert_eq!(env.get("ENV_FOO").unwrap(), Some(Value::from("A")));
    assert_eq!(env.get("ENV_BAR").unwrap(), Some(Value::from("${ENV_FOO}")));
    assert_eq!(env.subst("${ENV_BAR}").unwrap(), "A");

    assert_eq!(
        committed.get("bar").unwrap().default(Namespace::Var).unwrap(),
        Some(&Value::from("${FOO}"))
    );
}

#[test]
fn duplicate_key_leaves_set_unchanged() {
    let mut decls = GVarDecls::new();
    decls.insert("foo", foo()).unwrap();

    let baz = <GVarDecl as Default>::default()
        .with_env(("ENV_FOO", "Z"))
        .unwrap()
        .with_var("BAZ")
        .unwrap();
    let err = decls.insert("baz", baz).unwrap_err();
    match err {
        GVarError::DuplicateKey {
            namespace,
            key,
            existing,
            name,
        } => {
            assert_eq!(namespace, Namespace::Env);
            assert_eq!(key, "ENV_FOO");
            assert_eq!(existing, "foo");
            assert_eq!(name, "baz");
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert!(!decls.contains("baz"));
    assert_eq!(decls.rename_table(Namespace::Env), &table(&[("foo", "ENV_FOO")]));
    assert_eq!(decls.irename_table(Namespace::Env), &table(&[("ENV_FOO", "foo")]));
    // VAR tables weren't touched either, even though BAZ didn't collide
    assert_eq!(decls.irename_table(Namespace::Var), &table(&[("FOO", "foo")]));
}

#[test]
fn update_is_all_or_nothing() {
    let mut decls = GVarDecls::new();
    decls.insert("foo", foo()).unwrap();

    let result = decls.update(vec![
        ("bar", bar()),
        ("baz", <GVarDecl as Default>::default().with_var("BAR").unwrap()),
    ]);
    assert!(matches!(result, Err(GVarError::DuplicateKey { .. })));
    assert_eq!(decls.keys().collect::<Vec<_>>(), vec!["foo"]);

    decls.update(vec![("bar", bar())]).unwrap();
    assert_eq!(decls.keys().collect::<Vec<_>>(), vec!["foo", "bar"]);
}

#[test]
fn reinsert_replaces_keys() {
    let mut decls = GVarDecls::new();
    decls.insert("foo", foo()).unwrap();
    decls.insert("foo", foo()).unwrap();
    assert_eq!(decls.len(), 1);

    decls
        .insert("foo", <GVarDecl as Default>::default().with_env("ENV_FOO2").unwrap())
        .unwrap();
    assert_eq!(decls.rename_table(Namespace::Env), &table(&[("foo", "ENV_FOO2")]));
    assert!(decls.rename_table(Namespace::Var).is_empty());

    // ENV_FOO is free again
    decls
        .insert("other", <GVarDecl as Default>::default().with_env("ENV_FOO").unwrap())
        .unwrap();
}

#[test]
fn remove_frees_keys() {
    let mut decls = GVarDecls::from_decls(vec![("foo", foo()), ("bar", bar())]).unwrap();
    assert!(decls.remove("foo").is_some());
    assert!(decls.remove("foo").is_none());
    assert_eq!(decls.irename_table(Namespace::Env), &table(&[("ENV_BAR", "bar")]));

    decls
        .insert("foo2", <GVarDecl as Default>::default().with_env("ENV_FOO").unwrap())
        .unwrap();
}

#[test]
fn set_key_keeps_tables_in_sync() {
    let mut decls = GVarDecls::from_decls(vec![("foo", foo()), ("bar", bar())]).unwrap();

    let err = decls.set_key("bar", Namespace::Env, "ENV_FOO").unwrap_err();
    assert!(matches!(err, GVarError::DuplicateKey { .. }));

    decls.set_key("bar", Namespace::Env, "ENV_BAR2").unwrap();
    assert_eq!(decls.key("bar", Namespace::Env).unwrap(), "ENV_BAR2");
    assert_eq!(
        decls.irename_table(Namespace::Env),
        &table(&[("ENV_FOO", "foo"), ("ENV_BAR2", "bar")])
    );
    assert_eq!(
        decls.get("bar").unwrap().key(Namespace::Env).unwrap(),
        "ENV_BAR2"
    );

    assert!(matches!(
        decls.set_key("bar", Namespace::Opt, "bar"),
        Err(GVarError::UndeclaredNamespace { .. })
    ));
    assert!(matches!(
        decls.set_key("nope", Namespace::Env, "X"),
        Err(GVarError::UnknownGVar { .. })
    ));
    // an unknown name is reported even when its new key is taken
    assert!(matches!(
        decls.set_key("nope", Namespace::Env, "ENV_FOO"),
        Err(GVarError::UnknownGVar { name }) if name == "nope"
    ));
}

#[test]
fn lookup_errors() {
    let decls = GVarDecls::from_decls(vec![("foo", foo())]).unwrap();
    assert_eq!(decls.key("foo", Namespace::Var).unwrap(), "FOO");
    assert!(matches!(
        decls.key("foo", Namespace::Opt),
        Err(GVarError::UndeclaredNamespace { .. })
    ));
    assert!(matches!(
        decls.key("nope", Namespace::Env),
        Err(GVarError::UnknownGVar { .. })
    ));
}

#[test]
fn placeholder_tables() {
    let decls = GVarDecls::from_decls(vec![
        ("foo", foo()),
        ("bar", bar()),
        ("same", <GVarDecl as Default>::default().with_var("same").unwrap()),
    ])
    .unwrap();
    let committed = decls.commit(Targets::new()).unwrap();

    assert_eq!(
        committed.resubst_table(Namespace::Env),
        &table(&[("foo", "${ENV_FOO}"), ("bar", "${ENV_BAR}")])
    );
    assert_eq!(
        committed.iresubst_table(Namespace::Var),
        &table(&[("FOO", "${foo}"), ("BAR", "${bar}")])
    );
    assert!(committed.resubst_table(Namespace::Opt).is_empty());
}

#[test_log::test]
fn commit_materializes_once() {
    let decls = GVarDecls::from_decls(vec![
        (
            "foo",
            foo()
                .with_opt(("--foo", <OptParamsBuilder as Default>::default().dest("foo")))
                .unwrap(),
        ),
        ("bar", bar()),
    ])
    .unwrap();

    let mut env = TestEnv::default();
    let mut variables = TestVariables::default();
    let mut options = TestOptions::default();
    let committed = decls
        .commit(
            Targets::new()
                .env(&mut env)
                .variables(&mut variables)
                .options(&mut options),
        )
        .unwrap();

    assert_eq!(variables.keys(), vec!["FOO", "BAR"]);
    assert_eq!(options.added.len(), 1);

    let committed = committed
        .commit(Targets::new().variables(&mut variables).options(&mut options))
        .unwrap();
    assert_eq!(variables.keys(), vec!["FOO", "BAR"]);
    assert_eq!(options.added.len(), 1);
    assert_eq!(committed.len(), 2);

    let expected = hashmap! {
        "ENV_FOO".to_string() => Value::from("A"),
        "ENV_BAR".to_string() => Value::from("${ENV_FOO}"),
    };
    assert_eq!(env.vars.into_iter().collect::<std::collections::HashMap<_, _>>(), expected);
}

#[test]
fn explicit_add_to() {
    let committed = GVarDecls::from_decls(vec![("foo", foo())])
        .unwrap()
        .commit(Targets::new())
        .unwrap();

    let mut variables = TestVariables::default();
    committed
        .add_to(Targets::new().variables(&mut variables))
        .unwrap();
    assert_eq!(variables.keys(), vec!["FOO"]);
}

#[test]
fn from_uniform() {
    let decls = GVarDecls::from_uniform(vec![
        (
            "prefix",
            <UniformDeclBuilder as Default>::default()
                .env_key("GNUBLD_PREFIX")
                .var_key("PREFIX")
                .opt_key("gnubld_prefix")
                .option("--prefix")
                .default("/usr/local")
                .build()
                .unwrap(),
        ),
        (
            "bindir",
            <UniformDeclBuilder as Default>::default()
                .env_key("GNUBLD_BINDIR")
                .var_key("BINDIR")
                .default("${prefix}/bin")
                .build()
                .unwrap(),
        ),
    ])
    .unwrap();

    assert_eq!(decls.key("prefix", Namespace::Opt).unwrap(), "gnubld_prefix");
    let committed = decls.commit(Targets::new()).unwrap();
    assert_eq!(
        committed.get("bindir").unwrap().default(Namespace::Var).unwrap(),
        Some(&Value::from("${PREFIX}/bin"))
    );
}
