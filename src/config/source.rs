//! Named property sources and their ordered combination.

use std::collections::HashMap;

/// A named lookup table of configuration key/value pairs.
///
/// Sources are combined into a [`ConfigurationSnapshot`] in precedence order;
/// the name exists for logs and error context only.
#[derive(Debug, Clone)]
pub struct PropertySource {
    name: String,
    values: HashMap<String, String>,
}

impl PropertySource {
    /// Build a source from explicit pairs.
    pub fn new(name: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build the command-line source from `key=value` tokens.
    ///
    /// A leading `--` is stripped, so both `server.port=9999` and
    /// `--server.port=9999` work. A token without `=` becomes a key with an
    /// empty value. A later duplicate key wins.
    pub fn command_line(tokens: &[String]) -> Self {
        let mut values = HashMap::new();
        for token in tokens {
            let token = token.strip_prefix("--").unwrap_or(token);
            match token.split_once('=') {
                Some((key, value)) => values.insert(key.to_string(), value.to_string()),
                None => values.insert(token.to_string(), String::new()),
            };
        }
        Self::new("commandLineArgs", values)
    }

    /// Snapshot of the process environment.
    pub fn process_env() -> Self {
        Self::new("processEnvironment", std::env::vars().collect())
    }

    /// The source's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a key in this source alone.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// An ordered sequence of property sources, highest precedence first.
///
/// Created once per process start and immutable after construction. Lookups
/// scan the sources in order and return the first match.
#[derive(Debug, Clone)]
pub struct ConfigurationSnapshot {
    sources: Vec<PropertySource>,
}

impl ConfigurationSnapshot {
    /// Build a snapshot from sources already in precedence order.
    pub fn new(sources: Vec<PropertySource>) -> Self {
        Self { sources }
    }

    /// The snapshot for this process: the CLI source (only when tokens are
    /// present) ahead of the process environment.
    pub fn from_process(tokens: &[String]) -> Self {
        let mut sources = Vec::new();
        if !tokens.is_empty() {
            sources.push(PropertySource::command_line(tokens));
        }
        sources.push(PropertySource::process_env());
        Self::new(sources)
    }

    /// First match across sources, in precedence order.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|source| source.get(key))
    }
}
