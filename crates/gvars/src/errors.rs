use thiserror::Error;

use crate::namespace::Namespace;

#[derive(Error, Debug)]
pub enum GVarError {
    #[error("invalid {namespace} declaration: {reason}")]
    Validation { namespace: Namespace, reason: String },

    #[error("{namespace} variable {key:?} is already declared by {existing:?}, can't declare it for {name:?}")]
    DuplicateKey {
        namespace: Namespace,
        key: String,
        existing: String,
        name: String,
    },

    #[error("{name:?} has no {namespace} declaration")]
    UndeclaredNamespace { name: String, namespace: Namespace },

    #[error("{key:?} is not a declared key")]
    UndeclaredKey { key: String },

    #[error("no GVar named {name:?}")]
    UnknownGVar { name: String },

    #[error("variable {key:?} not found")]
    NotFound { key: String },

    #[error("a variable references itself: {var}")]
    RecursiveReference { var: String },

    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl GVarError {
    pub(crate) fn validation<R: Into<String>>(namespace: Namespace, reason: R) -> Self {
        GVarError::Validation {
            namespace,
            reason: reason.into(),
        }
    }

    pub(crate) fn undeclared_namespace<N: Into<String>>(name: N, namespace: Namespace) -> Self {
        GVarError::UndeclaredNamespace {
            name: name.into(),
            namespace,
        }
    }
}

pub type GVarResult<T> = Result<T, GVarError>;
