pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const API_URL_VAR: &str = "ORG_MEMORY_API_URL";
pub const ADMIN_KEY_VAR: &str = "ORG_MEMORY_ADMIN_KEY";

/// Where the backend lives and how to authenticate uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub admin_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            admin_key: None,
        }
    }

    /// Reads the process environment. Blank values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = present(API_URL_VAR)
            .map(|url| Self::new(&url))
            .unwrap_or_default();
        config.admin_key = present(ADMIN_KEY_VAR).map(|key| key.trim().to_string());
        config
    }

    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_local_backend() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.admin_key, None);
    }

    #[test]
    fn trims_trailing_slashes() {
        let config = ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "https://memory.example.com/api//")]));
        assert_eq!(config.api_base_url, "https://memory.example.com/api");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "  "), (ADMIN_KEY_VAR, "")]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn reads_admin_key() {
        let config = ClientConfig::from_lookup(lookup(&[(ADMIN_KEY_VAR, " s3cret ")]));
        assert_eq!(config.admin_key.as_deref(), Some("s3cret"));
    }
}
