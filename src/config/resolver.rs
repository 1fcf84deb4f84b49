//! Placeholder resolution and the effective listen address.

use thiserror::Error;

use crate::config::source::ConfigurationSnapshot;

/// Placeholder expression the listen port is resolved from.
const PORT_EXPRESSION: &str = "${server.port:${PORT:8080}}";

/// Placeholder expression the bind host is resolved from.
const ADDRESS_EXPRESSION: &str = "${server.address:0.0.0.0}";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A port value was present but is not an integer.
    #[error("invalid port value `{0}`")]
    InvalidPort(String),

    /// A `${...}` expression never closed its brace.
    #[error("unbalanced braces in placeholder `{0}`")]
    UnbalancedBraces(String),

    /// A placeholder key had no value in any source and no default.
    #[error("unresolvable placeholder `{0}`")]
    Unresolvable(String),
}

/// The resolved listen address for this process.
///
/// Derived once from a [`ConfigurationSnapshot`]. A negative port means
/// serving is disabled; port `0` delegates the choice to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveAddress {
    /// Host to bind, e.g. `0.0.0.0` or `127.0.0.1`.
    pub host: String,
    /// Configured port; negative disables serving.
    pub port: i32,
}

impl EffectiveAddress {
    /// Resolve the effective address from the snapshot.
    ///
    /// Precedence comes from the placeholder chains: `server.port`, then
    /// `PORT`, then the compiled-in `8080`; `server.address`, then `0.0.0.0`.
    /// With the CLI source ordered first in the snapshot, a CLI token beats
    /// an environment variable for the same key.
    pub fn resolve(snapshot: &ConfigurationSnapshot) -> Result<Self, ConfigError> {
        let port_text = resolve_placeholders(snapshot, PORT_EXPRESSION)?;
        let port = port_text
            .trim()
            .parse::<i32>()
            .map_err(|_| ConfigError::InvalidPort(port_text))?;
        let host = resolve_placeholders(snapshot, ADDRESS_EXPRESSION)?;
        Ok(Self { host, port })
    }
}

/// Expand every `${key}` / `${key:default}` in `text` against the snapshot.
///
/// A default may itself be a placeholder expression; the key/default split
/// happens at the first `:` outside nested braces. Looked-up values are
/// substituted verbatim. Text outside placeholders passes through untouched.
pub fn resolve_placeholders(
    snapshot: &ConfigurationSnapshot,
    text: &str,
) -> Result<String, ConfigError> {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body_start = start + 2;
        let body_len = matching_brace(&rest[body_start..])
            .ok_or_else(|| ConfigError::UnbalancedBraces(text.to_string()))?;
        let body = &rest[body_start..body_start + body_len];
        out.push_str(&resolve_expression(snapshot, body)?);
        rest = &rest[body_start + body_len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Resolve one placeholder body (the text between `${` and its `}`).
fn resolve_expression(snapshot: &ConfigurationSnapshot, body: &str) -> Result<String, ConfigError> {
    let (key, default) = split_key_default(body);
    if let Some(value) = snapshot.lookup(key) {
        return Ok(value.to_string());
    }
    match default {
        Some(default) => resolve_placeholders(snapshot, default),
        None => Err(ConfigError::Unresolvable(key.to_string())),
    }
}

/// Byte offset of the `}` closing the expression that starts right after a
/// `${`, accounting for nested `${...}` inside the default.
fn matching_brace(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b'}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split `key:default` at the first `:` outside nested braces.
fn split_key_default(body: &str) -> (&str, Option<&str>) {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b'}' if depth > 0 => depth -= 1,
            b':' if depth == 0 => return (&body[..i], Some(&body[i + 1..])),
            _ => {}
        }
        i += 1;
    }
    (body, None)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::source::PropertySource;

    fn source(name: &str, pairs: &[(&str, &str)]) -> PropertySource {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PropertySource::new(name, values)
    }

    fn snapshot(sources: Vec<PropertySource>) -> ConfigurationSnapshot {
        ConfigurationSnapshot::new(sources)
    }

    #[test]
    fn cli_token_overrides_environment() {
        let snap = snapshot(vec![
            source("commandLineArgs", &[("server.port", "9999")]),
            source("env", &[("PORT", "1234")]),
        ]);
        let address = EffectiveAddress::resolve(&snap).unwrap();
        assert_eq!(address.port, 9999);
    }

    #[test]
    fn environment_port_is_the_fallback() {
        let snap = snapshot(vec![source("env", &[("PORT", "1234")])]);
        let address = EffectiveAddress::resolve(&snap).unwrap();
        assert_eq!(address.port, 1234);
    }

    #[test]
    fn compiled_in_defaults_apply_last() {
        let snap = snapshot(vec![source("env", &[])]);
        let address = EffectiveAddress::resolve(&snap).unwrap();
        assert_eq!(address.port, 8080);
        assert_eq!(address.host, "0.0.0.0");
    }

    #[test]
    fn address_key_overrides_default_host() {
        let snap = snapshot(vec![source(
            "commandLineArgs",
            &[("server.address", "127.0.0.1")],
        )]);
        let address = EffectiveAddress::resolve(&snap).unwrap();
        assert_eq!(address.host, "127.0.0.1");
    }

    #[test]
    fn negative_port_resolves_as_configured() {
        let snap = snapshot(vec![source("commandLineArgs", &[("server.port", "-1")])]);
        let address = EffectiveAddress::resolve(&snap).unwrap();
        assert_eq!(address.port, -1);
    }

    #[test]
    fn malformed_port_is_an_error() {
        let snap = snapshot(vec![source("env", &[("PORT", "eighty-eighty")])]);
        let err = EffectiveAddress::resolve(&snap).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn literal_text_passes_through() {
        let snap = snapshot(vec![]);
        assert_eq!(resolve_placeholders(&snap, "plain").unwrap(), "plain");
    }

    #[test]
    fn surrounding_text_is_preserved() {
        let snap = snapshot(vec![source("s", &[("a", "1")])]);
        assert_eq!(
            resolve_placeholders(&snap, "pre-${a}-post").unwrap(),
            "pre-1-post"
        );
    }

    #[test]
    fn defaults_nest() {
        let snap = snapshot(vec![]);
        assert_eq!(resolve_placeholders(&snap, "${a:${b:${c:x}}}").unwrap(), "x");

        let snap = snapshot(vec![source("s", &[("b", "mid")])]);
        assert_eq!(
            resolve_placeholders(&snap, "${a:${b:${c:x}}}").unwrap(),
            "mid"
        );
    }

    #[test]
    fn missing_key_without_default_is_an_error() {
        let snap = snapshot(vec![]);
        let err = resolve_placeholders(&snap, "${nope}").unwrap_err();
        assert!(matches!(err, ConfigError::Unresolvable(_)));
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        let snap = snapshot(vec![]);
        let err = resolve_placeholders(&snap, "${a:${b}").unwrap_err();
        assert!(matches!(err, ConfigError::UnbalancedBraces(_)));
    }
}
