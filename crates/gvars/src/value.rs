use std::fmt::{Display, Formatter};

use derive_more::{From, TryInto};
use itertools::Itertools;

/// A value held by a construction variable, a command-line variable or an option.
///
/// Only [`Value::String`] takes part in placeholder rewriting; everything else is carried through
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq, From, TryInto)]
#[try_into(owned, ref)]
pub enum Value {
    /// Declared but unset. A construction variable created without a default holds this.
    #[from(skip)]
    #[try_into(ignore)]
    None,
    String(String),
    Bool(bool),
    Int(i64),
    List(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The text a host store substitutes for this value.
    pub fn render(&self) -> String {
        match self {
            Value::None => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(true) => "True".into(),
            Value::Bool(false) => "False".into(),
            Value::Int(i) => i.to_string(),
            Value::List(items) => items.iter().join(" "),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::List(value.into_iter().map(String::from).collect())
    }
}
