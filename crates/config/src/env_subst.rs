//! `${VAR}` / `${VAR:-default}` expansion over raw config text.

/// Expand placeholders from the process environment.
///
/// An unset variable without a default is left verbatim so validation can
/// report it.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let Some(end) = body.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        match expand(&body[..end], &lookup) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &body[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand(expr: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    match expr.split_once(":-") {
        Some((name, default)) if !name.is_empty() => Some(
            lookup(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string()),
        ),
        Some(_) => None,
        None if expr.is_empty() => None,
        None => lookup(expr),
    }
}
