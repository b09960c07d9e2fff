use regex::{Captures, Regex};

pub fn split_filter_empty<'a>(input: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    input.split(separator).filter(|v| !v.is_empty())
}

/// Split a list given either as a separated string or as repeated arguments, e.g.
/// `["prefix,bindir", "libdir"]` with separator `,`.
///
/// # Example
///
/// ```
/// use gvars_util::split::split_list_args;
/// let args = vec!["prefix,bindir".to_string(), "libdir".to_string()];
/// assert_eq!(split_list_args(&args, ","), vec!["prefix", "bindir", "libdir"]);
/// ```
pub fn split_list_args<'a, S: AsRef<str>>(args: &'a [S], separator: &'a str) -> Vec<&'a str> {
    args.iter()
        .flat_map(|arg| split_filter_empty(arg.as_ref(), separator))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

// From https://docs.rs/regex/latest/regex/struct.Regex.html#method.replace_all
pub fn replace_all<E>(
    re: &Regex,
    haystack: &str,
    mut replacement: impl FnMut(&Captures) -> Result<String, E>,
) -> Result<String, E> {
    let mut new = String::with_capacity(haystack.len());
    let mut last_match = 0;
    for caps in re.captures_iter(haystack) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        new.push_str(&haystack[last_match..m.start()]);
        new.push_str(&replacement(&caps)?);
        last_match = m.end();
    }
    new.push_str(&haystack[last_match..]);
    Ok(new)
}

#[cfg(test)]
mod test {
    use crate::split::{replace_all, split_filter_empty};
    use regex::Regex;

    #[test]
    fn filter_empty() {
        let parts: Vec<_> = split_filter_empty("a::b:", ":").collect();
        assert_eq!(parts, vec!["a", "b"]);
    }

    #[test]
    fn replace_all_stops_on_error() {
        let re = Regex::new(r"\d").unwrap();
        let ok: Result<String, ()> = replace_all(&re, "a1b2", |c| Ok(format!("<{}>", &c[0])));
        assert_eq!(ok.unwrap(), "a<1>b<2>");

        let err: Result<String, &str> = replace_all(&re, "a1b2", |_| Err("boom"));
        assert_eq!(err, Err("boom"));
    }
}
