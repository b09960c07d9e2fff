//! Declaration of a single GVar: up to one sub-declaration per [`Namespace`].
//!
//! Sub-declarations may be written in several shapes (see [`EnvDeclInput`], [`VarDeclInput`] and
//! [`OptDeclInput`]). Every shape is first normalized into one canonical record, which is then
//! validated on its own.

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::errors::{GVarError, GVarResult};
use crate::host::{Environment, EnvironmentMut, OptionRegistry, VariableSource};
use crate::namespace::Namespace;
use crate::value::Value;

type ValidatorFn = dyn Fn(&str, &Value, &dyn Environment) -> anyhow::Result<()>;
type ConverterFn = dyn Fn(&Value) -> anyhow::Result<Value>;
type CallbackFn = dyn Fn(&mut CallbackInvocation<'_>) -> anyhow::Result<()>;

/// Checks the value of a command-line variable once it has landed in the environment.
#[derive(Clone)]
pub struct Validator(Rc<ValidatorFn>);

impl Validator {
    pub fn new(f: impl Fn(&str, &Value, &dyn Environment) -> anyhow::Result<()> + 'static) -> Self {
        Validator(Rc::new(f))
    }

    pub fn validate(&self, key: &str, value: &Value, env: &dyn Environment) -> GVarResult<()> {
        (self.0)(key, value, env).map_err(GVarError::from)
    }
}

impl Debug for Validator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Turns the raw value of a command-line variable into the value stored in the environment.
#[derive(Clone)]
pub struct Converter(Rc<ConverterFn>);

impl Converter {
    pub fn new(f: impl Fn(&Value) -> anyhow::Result<Value> + 'static) -> Self {
        Converter(Rc::new(f))
    }

    pub fn convert(&self, value: &Value) -> GVarResult<Value> {
        (self.0)(value).map_err(GVarError::from)
    }
}

impl Debug for Converter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Converter(..)")
    }
}

/// What an option callback gets to see when its option is encountered on the command line.
pub struct CallbackInvocation<'a> {
    /// The option string as typed, e.g. `--foo`.
    pub opt_str: &'a str,
    pub value: Option<&'a str>,
    pub dest: &'a str,
    pub args: &'a [Value],
    pub kwargs: &'a IndexMap<String, Value>,
    /// Parsed option values, keyed by destination.
    pub values: &'a mut IndexMap<String, Value>,
}

#[derive(Clone)]
pub struct Callback(Rc<CallbackFn>);

impl Callback {
    pub fn new(f: impl Fn(&mut CallbackInvocation<'_>) -> anyhow::Result<()> + 'static) -> Self {
        Callback(Rc::new(f))
    }

    pub fn call(&self, invocation: &mut CallbackInvocation<'_>) -> GVarResult<()> {
        (self.0)(invocation).map_err(GVarError::from)
    }
}

impl Debug for Callback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Callback(..)")
    }
}

#[derive(Eq, PartialEq, Debug, Copy, Clone, Default)]
pub enum OptAction {
    #[default]
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    Count,
    Callback,
}

impl OptAction {
    /// Whether the option consumes argument(s) from the command line.
    pub fn takes_value(self) -> bool {
        matches!(self, OptAction::Store | OptAction::Append)
    }
}

#[derive(Eq, PartialEq, Debug, Copy, Clone, Default)]
pub enum OptKind {
    #[default]
    String,
    Int,
    Choice,
}

/// Parameters of a command-line option. `dest` identifies the option and is its key in the OPT
/// namespace.
#[derive(Clone, Debug, Builder)]
#[builder(setter(into))]
pub struct OptParams {
    pub dest: String,
    #[builder(default, setter(strip_option))]
    pub default: Option<Value>,
    #[builder(default, setter(strip_option))]
    pub help: Option<String>,
    #[builder(default, setter(strip_option))]
    pub kind: Option<OptKind>,
    #[builder(default, setter(strip_option))]
    pub metavar: Option<String>,
    #[builder(default, setter(strip_option))]
    pub nargs: Option<usize>,
    #[builder(default, setter(strip_option))]
    pub choices: Option<Vec<String>>,
    #[builder(default, setter(strip_option))]
    pub action: Option<OptAction>,
    #[builder(default, setter(strip_option))]
    pub const_value: Option<Value>,
    #[builder(default, setter(strip_option))]
    pub callback: Option<Callback>,
    #[builder(default)]
    pub callback_args: Vec<Value>,
    #[builder(default)]
    pub callback_kwargs: IndexMap<String, Value>,
}

impl OptParams {
    pub fn action(&self) -> OptAction {
        self.action.unwrap_or_default()
    }

    pub fn kind(&self) -> OptKind {
        match self.kind {
            Some(kind) => kind,
            None if self.choices.is_some() => OptKind::Choice,
            None => OptKind::String,
        }
    }

    pub fn nargs(&self) -> usize {
        self.nargs.unwrap_or(1)
    }
}

/// ENV sub-declaration: a construction variable and its default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvDecl {
    key: String,
    default: Option<Value>,
    create: bool,
}

impl EnvDecl {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether committing creates the variable in the environment.
    pub fn creates(&self) -> bool {
        self.create
    }
}

/// VAR sub-declaration: a command-line variable.
#[derive(Clone, Debug)]
pub struct VarDecl {
    key: String,
    help: String,
    default: Option<Value>,
    validator: Option<Validator>,
    converter: Option<Converter>,
}

impl VarDecl {
    pub fn new<K: Into<String>, H: Into<String>>(key: K, help: H) -> Self {
        VarDecl {
            key: key.into(),
            help: help.into(),
            default: None,
            validator: None,
            converter: None,
        }
    }

    pub fn with_default<V: Into<Value>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }
}

/// OPT sub-declaration: option strings plus their parameters.
#[derive(Clone, Debug)]
pub struct OptDecl {
    names: Vec<String>,
    params: OptParams,
}

impl OptDecl {
    pub fn key(&self) -> &str {
        &self.params.dest
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn params(&self) -> &OptParams {
        &self.params
    }
}

/// Accepted shapes of an ENV sub-declaration.
pub enum EnvDeclInput {
    /// The variable is known but committing does not create it.
    Key(String),
    KeyDefault(String, Option<Value>),
    /// `{key: default}`; exactly one entry.
    Map(IndexMap<String, Option<Value>>),
}

impl From<&str> for EnvDeclInput {
    fn from(value: &str) -> Self {
        EnvDeclInput::Key(value.to_string())
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for EnvDeclInput {
    fn from((key, default): (K, V)) -> Self {
        EnvDeclInput::KeyDefault(key.into(), Some(default.into()))
    }
}

/// Accepted shapes of a VAR sub-declaration.
pub enum VarDeclInput {
    Key(String),
    KeyHelp(String, String),
    KeyHelpDefault(String, String, Value),
    /// Fields by name: `key` (required), `help`, `default`.
    Map(IndexMap<String, Value>),
    Decl(VarDecl),
}

impl From<&str> for VarDeclInput {
    fn from(value: &str) -> Self {
        VarDeclInput::Key(value.to_string())
    }
}

impl From<(&str, &str)> for VarDeclInput {
    fn from((key, help): (&str, &str)) -> Self {
        VarDeclInput::KeyHelp(key.to_string(), help.to_string())
    }
}

impl<V: Into<Value>> From<(&str, &str, V)> for VarDeclInput {
    fn from((key, help, default): (&str, &str, V)) -> Self {
        VarDeclInput::KeyHelpDefault(key.to_string(), help.to_string(), default.into())
    }
}

impl From<VarDecl> for VarDeclInput {
    fn from(value: VarDecl) -> Self {
        VarDeclInput::Decl(value)
    }
}

/// Accepted shapes of an OPT sub-declaration.
pub enum OptDeclInput {
    /// Whitespace-separated option strings, e.g. `"-f --foo"`.
    Spec(String, OptParamsBuilder),
    Names(Vec<String>, OptParamsBuilder),
}

impl From<(&str, OptParamsBuilder)> for OptDeclInput {
    fn from((spec, params): (&str, OptParamsBuilder)) -> Self {
        OptDeclInput::Spec(spec.to_string(), params)
    }
}

impl From<(&str, &mut OptParamsBuilder)> for OptDeclInput {
    fn from((spec, params): (&str, &mut OptParamsBuilder)) -> Self {
        OptDeclInput::Spec(spec.to_string(), params.clone())
    }
}

impl From<(Vec<&str>, OptParamsBuilder)> for OptDeclInput {
    fn from((names, params): (Vec<&str>, OptParamsBuilder)) -> Self {
        OptDeclInput::Names(names.into_iter().map(String::from).collect(), params)
    }
}

fn normalize_env(input: EnvDeclInput) -> GVarResult<EnvDecl> {
    let (key, default, create) = match input {
        EnvDeclInput::Key(key) => (key, None, false),
        EnvDeclInput::KeyDefault(key, default) => (key, default, true),
        EnvDeclInput::Map(map) => {
            let len = map.len();
            match (len, map.into_iter().next()) {
                (1, Some((key, default))) => (key, default, true),
                _ => {
                    return Err(GVarError::validation(
                        Namespace::Env,
                        format!("map must have 1 item but has {len}"),
                    ));
                }
            }
        }
    };

    Ok(EnvDecl {
        key,
        default,
        create,
    })
}

fn normalize_var(input: VarDeclInput) -> GVarResult<VarDecl> {
    let decl = match input {
        VarDeclInput::Key(key) => VarDecl::new(key, ""),
        VarDeclInput::KeyHelp(key, help) => VarDecl::new(key, help),
        VarDeclInput::KeyHelpDefault(key, help, default) => VarDecl::new(key, help).with_default(default),
        VarDeclInput::Decl(decl) => decl,
        VarDeclInput::Map(mut map) => {
            let key = match map.shift_remove("key") {
                Some(Value::String(key)) => key,
                Some(other) => {
                    return Err(GVarError::validation(
                        Namespace::Var,
                        format!("'key' must be a string, {other:?} is not allowed"),
                    ));
                }
                None => return Err(GVarError::validation(Namespace::Var, "'key' is missing")),
            };
            let help = match map.shift_remove("help") {
                Some(Value::String(help)) => help,
                Some(other) => {
                    return Err(GVarError::validation(
                        Namespace::Var,
                        format!("'help' must be a string, {other:?} is not allowed"),
                    ));
                }
                None => String::new(),
            };
            let mut decl = VarDecl::new(key, help);
            decl.default = map.shift_remove("default");
            if let Some(unknown) = map.keys().next() {
                return Err(GVarError::validation(
                    Namespace::Var,
                    format!("unknown field {unknown:?}"),
                ));
            }
            decl
        }
    };
    Ok(decl)
}

fn normalize_opt(input: OptDeclInput) -> GVarResult<OptDecl> {
    let (names, builder) = match input {
        OptDeclInput::Spec(spec, builder) => (
            spec.split_whitespace().map(String::from).collect::<Vec<_>>(),
            builder,
        ),
        OptDeclInput::Names(names, builder) => (names, builder),
    };

    let params = builder
        .build()
        .map_err(|e| GVarError::validation(Namespace::Opt, e.to_string()))?;

    Ok(OptDecl { names, params })
}

fn validate_key(namespace: Namespace, key: &str) -> GVarResult<()> {
    if key.is_empty() {
        return Err(GVarError::validation(namespace, "key must not be empty"));
    }
    if key.contains(|c: char| c.is_whitespace() || c == '$' || c == '{' || c == '}') {
        return Err(GVarError::validation(
            namespace,
            format!("{key:?} is not a valid key"),
        ));
    }
    Ok(())
}

impl EnvDecl {
    fn validate(&self) -> GVarResult<()> {
        validate_key(Namespace::Env, &self.key)
    }
}

impl VarDecl {
    fn validate(&self) -> GVarResult<()> {
        validate_key(Namespace::Var, &self.key)
    }
}

impl OptDecl {
    fn validate(&self) -> GVarResult<()> {
        if self.names.is_empty() {
            return Err(GVarError::validation(
                Namespace::Opt,
                "at least one option string is required",
            ));
        }
        for name in &self.names {
            let valid = match name.strip_prefix("--") {
                Some(long) => !long.is_empty(),
                None => name.len() == 2 && name.starts_with('-'),
            };
            if !valid {
                return Err(GVarError::validation(
                    Namespace::Opt,
                    format!("invalid option string {name:?}: must be -x or --long"),
                ));
            }
        }

        validate_key(Namespace::Opt, &self.params.dest)?;

        if self.params.nargs == Some(0) {
            return Err(GVarError::validation(Namespace::Opt, "nargs must be at least 1"));
        }
        if self.params.kind() == OptKind::Choice && self.params.choices.is_none() {
            return Err(GVarError::validation(
                Namespace::Opt,
                "choice options need 'choices'",
            ));
        }
        if self.params.action() == OptAction::Callback && self.params.callback.is_none() {
            return Err(GVarError::validation(
                Namespace::Opt,
                "callback action needs a 'callback'",
            ));
        }
        Ok(())
    }
}

/// Where a declaration gets materialized.
pub enum Target<'a> {
    Env(&'a mut dyn EnvironmentMut),
    Variables(&'a mut dyn VariableSource),
    Options(&'a mut dyn OptionRegistry),
}

impl Target<'_> {
    pub fn namespace(&self) -> Namespace {
        match self {
            Target::Env(_) => Namespace::Env,
            Target::Variables(_) => Namespace::Var,
            Target::Options(_) => Namespace::Opt,
        }
    }
}

/// Declaration of one GVar.
#[derive(Clone, Debug, Default)]
pub struct GVarDecl {
    env: Option<EnvDecl>,
    var: Option<VarDecl>,
    opt: Option<OptDecl>,
}

impl GVarDecl {
    pub fn new(
        env: Option<EnvDeclInput>,
        var: Option<VarDeclInput>,
        opt: Option<OptDeclInput>,
    ) -> GVarResult<Self> {
        let mut decl = <GVarDecl as Default>::default();
        if let Some(env) = env {
            decl = decl.with_env(env)?;
        }
        if let Some(var) = var {
            decl = decl.with_var(var)?;
        }
        if let Some(opt) = opt {
            decl = decl.with_opt(opt)?;
        }
        Ok(decl)
    }

    pub fn with_env<I: Into<EnvDeclInput>>(mut self, input: I) -> GVarResult<Self> {
        let env = normalize_env(input.into())?;
        env.validate()?;
        self.env = Some(env);
        Ok(self)
    }

    pub fn with_var<I: Into<VarDeclInput>>(mut self, input: I) -> GVarResult<Self> {
        let var = normalize_var(input.into())?;
        var.validate()?;
        self.var = Some(var);
        Ok(self)
    }

    pub fn with_opt<I: Into<OptDeclInput>>(mut self, input: I) -> GVarResult<Self> {
        let opt = normalize_opt(input.into())?;
        opt.validate()?;
        self.opt = Some(opt);
        Ok(self)
    }

    pub fn env(&self) -> Option<&EnvDecl> {
        self.env.as_ref()
    }

    pub fn var(&self) -> Option<&VarDecl> {
        self.var.as_ref()
    }

    pub fn opt(&self) -> Option<&OptDecl> {
        self.opt.as_ref()
    }

    pub fn has_decl(&self, ns: Namespace) -> bool {
        match ns {
            Namespace::Env => self.env.is_some(),
            Namespace::Var => self.var.is_some(),
            Namespace::Opt => self.opt.is_some(),
        }
    }

    /// The namespaces this GVar is declared in.
    pub fn namespaces(&self) -> impl Iterator<Item = Namespace> + '_ {
        Namespace::ALL.into_iter().filter(|ns| self.has_decl(*ns))
    }

    pub fn key(&self, ns: Namespace) -> GVarResult<&str> {
        self.declared_key(ns).ok_or_else(|| self.missing(ns))
    }

    fn declared_key(&self, ns: Namespace) -> Option<&str> {
        match ns {
            Namespace::Env => self.env.as_ref().map(EnvDecl::key),
            Namespace::Var => self.var.as_ref().map(VarDecl::key),
            Namespace::Opt => self.opt.as_ref().map(OptDecl::key),
        }
    }

    /// Rekey one namespace. The owning set keeps its lookup tables in sync, see
    /// [`GVarDecls::set_key`](crate::decls::GVarDecls::set_key).
    pub(crate) fn set_key(&mut self, ns: Namespace, key: String) -> GVarResult<()> {
        validate_key(ns, &key)?;
        let missing = self.missing(ns);
        match ns {
            Namespace::Env => self.env.as_mut().ok_or(missing)?.key = key,
            Namespace::Var => self.var.as_mut().ok_or(missing)?.key = key,
            Namespace::Opt => self.opt.as_mut().ok_or(missing)?.params.dest = key,
        }
        Ok(())
    }

    pub fn default(&self, ns: Namespace) -> GVarResult<Option<&Value>> {
        let default = match ns {
            Namespace::Env => self.env.as_ref().map(EnvDecl::default),
            Namespace::Var => self.var.as_ref().map(VarDecl::default),
            Namespace::Opt => self.opt.as_ref().map(|o| o.params.default.as_ref()),
        };
        default.ok_or_else(|| self.missing(ns))
    }

    pub fn set_default(&mut self, ns: Namespace, default: Option<Value>) -> GVarResult<()> {
        let missing = self.missing(ns);
        match ns {
            Namespace::Env => self.env.as_mut().ok_or(missing)?.default = default,
            Namespace::Var => self.var.as_mut().ok_or(missing)?.default = default,
            Namespace::Opt => self.opt.as_mut().ok_or(missing)?.params.default = default,
        }
        Ok(())
    }

    /// Create the variable/option this GVar declares for `target`'s namespace.
    pub fn add_to(&self, target: Target<'_>) -> GVarResult<()> {
        match target {
            Target::Env(env) => {
                let decl = self.env.as_ref().ok_or_else(|| self.missing(Namespace::Env))?;
                if decl.create {
                    let default = decl.default.clone().unwrap_or(Value::None);
                    env.set_default(&decl.key, default)?;
                }
                Ok(())
            }
            Target::Variables(variables) => {
                let decl = self.var.as_ref().ok_or_else(|| self.missing(Namespace::Var))?;
                variables.add_variable(decl)
            }
            Target::Options(options) => {
                let decl = self.opt.as_ref().ok_or_else(|| self.missing(Namespace::Opt))?;
                options.add_option(&decl.names, &decl.params)
            }
        }
    }

    /// Like [`GVarDecl::add_to`], but does nothing and returns `false` when this GVar has no
    /// declaration for `target`'s namespace.
    pub fn safe_add_to(&self, target: Target<'_>) -> GVarResult<bool> {
        if self.has_decl(target.namespace()) {
            self.add_to(target)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn missing(&self, namespace: Namespace) -> GVarError {
        // The declaration doesn't know its own name; describe it by whatever keys it has.
        let name = Namespace::ALL
            .into_iter()
            .filter(|ns| *ns != namespace)
            .find_map(|ns| self.declared_key(ns))
            .unwrap_or("<empty>");
        GVarError::undeclared_namespace(name, namespace)
    }
}
