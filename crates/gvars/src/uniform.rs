use derive_builder::Builder;
use indexmap::IndexMap;
use tracing::trace;

use crate::decl::{
    Callback, Converter, EnvDeclInput, GVarDecl, OptAction, OptDeclInput, OptKind,
    OptParamsBuilder, Validator, VarDecl,
};
use crate::errors::{GVarError, GVarResult};
use crate::namespace::Namespace;
use crate::value::Value;

/// Flat, keyword-style description of a GVar, covering all three namespaces at once.
///
/// - `env_key` declares the ENV variable, with `default` as its default. The variable is created
///   on commit even without a default; it then holds [`Value::None`].
/// - `var_key` declares the VAR variable with `default`, `help`, `validator` and `converter`.
/// - `opt_key` *and* `option` together declare the OPT option: `option` holds the option strings,
///   `opt_key` becomes its destination, and `opt_default` its default.
#[derive(Clone, Debug, Default, Builder)]
#[builder(setter(into), default)]
pub struct UniformDecl {
    #[builder(setter(strip_option))]
    pub env_key: Option<String>,
    #[builder(setter(strip_option))]
    pub var_key: Option<String>,
    #[builder(setter(strip_option))]
    pub opt_key: Option<String>,
    #[builder(setter(strip_option))]
    pub default: Option<Value>,
    #[builder(setter(strip_option))]
    pub help: Option<String>,
    #[builder(setter(strip_option))]
    pub validator: Option<Validator>,
    #[builder(setter(strip_option))]
    pub converter: Option<Converter>,
    #[builder(setter(strip_option))]
    pub option: Option<String>,
    #[builder(setter(strip_option))]
    pub kind: Option<OptKind>,
    #[builder(setter(strip_option))]
    pub opt_default: Option<Value>,
    #[builder(setter(strip_option))]
    pub metavar: Option<String>,
    #[builder(setter(strip_option))]
    pub nargs: Option<usize>,
    #[builder(setter(strip_option))]
    pub choices: Option<Vec<String>>,
    #[builder(setter(strip_option))]
    pub action: Option<OptAction>,
    #[builder(setter(strip_option))]
    pub const_value: Option<Value>,
    #[builder(setter(strip_option))]
    pub callback: Option<Callback>,
    pub callback_args: Vec<Value>,
    pub callback_kwargs: IndexMap<String, Value>,
}

impl UniformDecl {
    pub fn into_decl(self) -> GVarResult<GVarDecl> {
        let mut decl = <GVarDecl as Default>::default();

        if let Some(env_key) = self.env_key {
            decl = decl.with_env(EnvDeclInput::KeyDefault(env_key, self.default.clone()))?;
        }

        if let Some(var_key) = self.var_key {
            let mut var = VarDecl::new(var_key, self.help.clone().unwrap_or_default());
            if let Some(default) = self.default {
                var = var.with_default(default);
            }
            if let Some(validator) = self.validator {
                var = var.with_validator(validator);
            }
            if let Some(converter) = self.converter {
                var = var.with_converter(converter);
            }
            decl = decl.with_var(var)?;
        }

        match (self.opt_key, self.option) {
            (Some(opt_key), Some(option)) => {
                let mut params = <OptParamsBuilder as Default>::default();
                params
                    .dest(opt_key)
                    .callback_args(self.callback_args)
                    .callback_kwargs(self.callback_kwargs);
                if let Some(v) = self.opt_default {
                    params.default(v);
                }
                if let Some(v) = self.help {
                    params.help(v);
                }
                if let Some(v) = self.kind {
                    params.kind(v);
                }
                if let Some(v) = self.metavar {
                    params.metavar(v);
                }
                if let Some(v) = self.nargs {
                    params.nargs(v);
                }
                if let Some(v) = self.choices {
                    params.choices(v);
                }
                if let Some(v) = self.action {
                    params.action(v);
                }
                if let Some(v) = self.const_value {
                    params.const_value(v);
                }
                if let Some(v) = self.callback {
                    params.callback(v);
                }
                decl = decl.with_opt(OptDeclInput::Spec(option, params))?;
            }
            (Some(opt_key), None) => {
                trace!(opt_key = %opt_key, "no option strings given, not declaring an option");
            }
            _ => {}
        }

        Ok(decl)
    }
}

impl TryFrom<UniformDecl> for GVarDecl {
    type Error = GVarError;

    fn try_from(value: UniformDecl) -> Result<Self, Self::Error> {
        value.into_decl()
    }
}

impl UniformDeclBuilder {
    /// Build the [`UniformDecl`] and turn it into a [`GVarDecl`].
    pub fn decl(&self) -> GVarResult<GVarDecl> {
        self.build()
            .map_err(|e| GVarError::validation(Namespace::Env, e.to_string()))?
            .into_decl()
    }
}
