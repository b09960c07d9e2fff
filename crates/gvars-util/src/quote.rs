use itertools::Itertools;

/// Quote `value` with double quotes, escaping backslashes, quotes and line breaks.
pub fn quote(value: &str) -> String {
    let escaped = value
        .chars()
        .map(|c| match c {
            '\\' => "\\\\".to_string(),
            '"' => "\\\"".to_string(),
            '\n' => "\\n".to_string(),
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        })
        .join("");
    format!("\"{escaped}\"")
}

/// Reverse of [`quote`]. Returns `None` when `input` is not a well-formed double-quoted string.
pub fn unquote(input: &str) -> Option<String> {
    let inner = input.strip_prefix('"')?.strip_suffix('"')?;

    let mut ret = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => ret.push('\n'),
                't' => ret.push('\t'),
                other => ret.push(other),
            },
            '"' => return None,
            c => ret.push(c),
        }
    }

    Some(ret)
}

#[cfg(test)]
mod test {
    use crate::quote::{quote, unquote};

    #[test]
    fn quoting() {
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(unquote(r#""a \"b\" \\c""#).unwrap(), r#"a "b" \c"#);
    }

    #[test]
    fn malformed() {
        assert_eq!(unquote("no quotes"), None);
        assert_eq!(unquote(r#""dangling\""#), None);
        assert_eq!(unquote(r#""inner " quote""#), None);
    }
}
