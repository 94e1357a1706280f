use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Matches `{{ env.NAME }}` and `{{ env.NAME | default("value") }}`
fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

/// Substitute environment placeholders in raw config text
///
/// Comment lines are left untouched so a commented-out secret never
/// requires its variable to be set.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut expanded: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            expanded.push(line.to_owned());
            continue;
        }

        let mut failure = None;
        let replaced = placeholder().replace_all(line, |caps: &Captures<'_>| {
            resolve(caps).unwrap_or_else(|e| {
                failure.get_or_insert(e);
                String::new()
            })
        });

        if let Some(e) = failure {
            return Err(e);
        }

        expanded.push(replaced.into_owned());
    }

    let mut output = expanded.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn resolve(caps: &Captures<'_>) -> Result<String, String> {
    let key = &caps[1];
    let fallback = caps.get(2).map(|m| m.as_str());

    let Some(name) = key.strip_prefix("env.").filter(|n| !n.is_empty() && !n.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(format!("environment variable not found: `{name}`")),
    }
}
