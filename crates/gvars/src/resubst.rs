//! Placeholder renaming between namespaces.
//!
//! A *rename table* maps names from one namespace to another, e.g. `{"foo": "ENV_FOO"}`. A
//! *resubst table* maps names to the placeholder that should replace them, e.g.
//! `{"foo": "${ENV_FOO}"}`, and is what [`resubst`] consumes.
//!
//! Names missing from a resubst table are never an error: the placeholder is kept verbatim, since
//! it may refer to something that only a later stage (or the host store itself) knows about.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::Value;

/// Insertion-ordered `name -> name` (or `name -> placeholder`) table.
pub type NameTable = IndexMap<String, String>;

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\})")
        .unwrap()
});

/// Rename every `$name` / `${name}` in `text` found in `table`.
///
/// ```
/// use gvars::resubst::resubst_str;
/// let table = [("foo".to_string(), "${ENV_FOO}".to_string())].into_iter().collect();
/// assert_eq!(resubst_str("$foo and ${bar}", &table), "${ENV_FOO} and ${bar}");
/// ```
pub fn resubst_str(text: &str, table: &NameTable) -> String {
    if !text.contains('$') {
        return text.to_string();
    }

    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            if caps.name("escaped").is_some() {
                return whole.to_string();
            }

            let name = caps
                .name("named")
                .or_else(|| caps.name("braced"))
                .map(|m| m.as_str())
                .unwrap_or_default();

            table
                .get(name)
                .cloned()
                .unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

/// Like [`resubst_str`], for any value. Non-string values are returned unaltered.
pub fn resubst(value: &Value, table: &NameTable) -> Value {
    match value {
        Value::String(s) => Value::String(resubst_str(s, table)),
        other => other.clone(),
    }
}

pub fn resubst_opt(value: Option<&Value>, table: &NameTable) -> Option<Value> {
    value.map(|v| resubst(v, table))
}

fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}

/// `{"xxx": "yyy"}` becomes `{"xxx": "${yyy}"}`. Identity entries are dropped.
pub fn build_resubst_table(rename: &NameTable) -> NameTable {
    rename
        .iter()
        .filter(|(k, v)| k != v)
        .map(|(k, v)| (k.clone(), placeholder(v)))
        .collect()
}

/// `{"xxx": "yyy"}` becomes `{"yyy": "${xxx}"}`. Identity entries are dropped.
pub fn build_iresubst_table(rename: &NameTable) -> NameTable {
    rename
        .iter()
        .filter(|(k, v)| k != v)
        .map(|(k, v)| (v.clone(), placeholder(k)))
        .collect()
}

/// `{k: second[first[k]]}`. Entries whose intermediate name is absent from `second` are dropped.
pub fn compose(first: &NameTable, second: &NameTable) -> NameTable {
    first
        .iter()
        .filter_map(|(k, v)| second.get(v).map(|v2| (k.clone(), v2.clone())))
        .collect()
}

pub fn invert(table: &NameTable) -> NameTable {
    table.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
}

#[cfg(test)]
mod test {
    use crate::resubst::{
        NameTable, build_iresubst_table, build_resubst_table, compose, invert, resubst, resubst_str,
    };
    use crate::value::Value;

    fn table(items: &[(&str, &str)]) -> NameTable {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(resubst_str("foo bar", &table(&[])), "foo bar");
        assert_eq!(resubst_str("foo bar", &table(&[("foo", "XFOO")])), "foo bar");
    }

    #[test]
    fn plain_and_braced() {
        assert_eq!(resubst_str("foo $bar", &table(&[("bar", "XBAR")])), "foo XBAR");
        assert_eq!(
            resubst_str("$foo $bar", &table(&[("foo", "XFOO"), ("bar", "XBAR")])),
            "XFOO XBAR"
        );
        assert_eq!(resubst_str("foo ${bar}", &table(&[("bar", "XBAR")])), "foo XBAR");
        assert_eq!(
            resubst_str("${foo} ${bar}", &table(&[("foo", "XFOO"), ("bar", "XBAR")])),
            "XFOO XBAR"
        );
    }

    #[test]
    fn single_pass() {
        assert_eq!(
            resubst_str("$foo $bar", &table(&[("foo", "$bar"), ("bar", "XBAR")])),
            "$bar XBAR"
        );
        assert_eq!(
            resubst_str("${foo} ${bar}", &table(&[("foo", "${bar}"), ("bar", "XBAR")])),
            "${bar} XBAR"
        );
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let empty = table(&[]);
        assert_eq!(resubst_str("$unknown_name stays", &empty), "$unknown_name stays");
        assert_eq!(
            resubst_str("${unknown} and $other", &table(&[("foo", "X")])),
            "${unknown} and $other"
        );
    }

    #[test]
    fn escapes_and_stray_dollars() {
        let t = table(&[("foo", "${ENV_FOO}")]);
        assert_eq!(resubst_str("$$foo", &t), "$$foo");
        assert_eq!(resubst_str("cost: 5$", &t), "cost: 5$");
        assert_eq!(resubst_str("${not closed", &t), "${not closed");
        assert_eq!(resubst_str("$foo/bin", &t), "${ENV_FOO}/bin");
        assert_eq!(resubst_str("$foobar", &t), "$foobar");
    }

    #[test]
    fn non_strings_untouched() {
        let t = table(&[("foo", "${ENV_FOO}")]);
        assert_eq!(resubst(&Value::Int(3), &t), Value::Int(3));
        assert_eq!(
            resubst(&Value::from(vec!["$foo"]), &t),
            Value::from(vec!["$foo"])
        );
        assert_eq!(resubst(&Value::from("$foo"), &t), Value::from("${ENV_FOO}"));
    }

    #[test]
    fn resubst_tables() {
        assert!(build_resubst_table(&table(&[])).is_empty());
        assert_eq!(
            build_resubst_table(&table(&[("xxx", "yyy"), ("vvv", "www"), ("zzz", "zzz")])),
            table(&[("xxx", "${yyy}"), ("vvv", "${www}")])
        );
        assert!(build_iresubst_table(&table(&[])).is_empty());
        assert_eq!(
            build_iresubst_table(&table(&[("xxx", "yyy"), ("vvv", "www"), ("zzz", "zzz")])),
            table(&[("yyy", "${xxx}"), ("www", "${vvv}")])
        );
    }

    #[test]
    fn composition() {
        assert!(compose(&table(&[]), &table(&[])).is_empty());
        assert_eq!(
            compose(
                &table(&[("uuu", "vvv"), ("xxx", "yyy")]),
                &table(&[("vvv", "VVV"), ("yyy", "YYY")])
            ),
            table(&[("uuu", "VVV"), ("xxx", "YYY")])
        );
        assert_eq!(
            compose(&table(&[("uuu", "vvv"), ("xxx", "missing")]), &table(&[("vvv", "VVV")])),
            table(&[("uuu", "VVV")])
        );
        assert_eq!(invert(&table(&[("a", "b")])), table(&[("b", "a")]));
    }
}
