//! `${VAR}` substitution in configuration strings.
//!
//! `${VAR}` takes the variable's value and fails when it is unset;
//! `${VAR:-fallback}` uses `fallback` instead. A `$` that does not open a
//! `${...}` reference is kept literally, so `/static/$js` stays as written.

use std::borrow::Cow;
use std::env::VarError;

use crate::ConfigError;

/// Substitute `${...}` references in `value`.
///
/// `field` names the setting in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let escaped = escape_bare_dollars(value);
    let expanded = shellexpand::env_with_context(&*escaped, |name: &str| {
        std::env::var(name).map(Some)
    })
    .map_err(|e| {
        let problem = match e.cause {
            VarError::NotPresent => "not set",
            VarError::NotUnicode(_) => "not valid unicode",
        };
        ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} {problem}", e.var_name),
        }
    })?;
    Ok(expanded.into_owned())
}

/// [`expand_env`] on a setting that may be absent.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(raw) = value.as_mut() {
        *raw = expand_env(raw, field)?;
    }
    Ok(())
}

/// Double every `$` outside a `${...}` reference.
///
/// shellexpand reads `$name` as a reference too and turns `$$` back into a
/// single `$`. Text inside `${...}` (fallbacks included) is copied verbatim.
fn escape_bare_dollars(value: &str) -> Cow<'_, str> {
    if !value.contains('$') {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 4);
    let mut rest = value;
    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match tail.find('}').filter(|_| tail.starts_with("${")) {
            Some(close) => {
                out.push_str(&tail[..=close]);
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str("$$");
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
