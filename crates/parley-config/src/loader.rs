use std::path::Path;

use crate::Config;
use crate::images::check_web_scheme;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), "configuration loaded");

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a duration does not parse, the model policy is
    /// unusable, or a URL has an unsupported scheme
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_durations()?;
        self.validate_chat()?;
        self.validate_urls()?;

        if self.upstream.max_concurrent_requests == 0 {
            anyhow::bail!("upstream.max_concurrent_requests must be greater than 0");
        }

        if !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }

    fn validate_durations(&self) -> anyhow::Result<()> {
        self.images.retention()?;
        self.imagegen.storage_timeout()?;
        self.imagegen.download_timeout()?;
        Ok(())
    }

    fn validate_chat(&self) -> anyhow::Result<()> {
        if self.chat.models.is_empty() {
            anyhow::bail!("chat.models must list at least one model");
        }

        if !self.chat.models.contains(&self.chat.fallback_model) {
            anyhow::bail!(
                "chat.fallback_model '{}' must be one of chat.models",
                self.chat.fallback_model
            );
        }

        Ok(())
    }

    fn validate_urls(&self) -> anyhow::Result<()> {
        check_web_scheme("upstream.base_url", &self.upstream.base_url)?;
        check_web_scheme("images.public_base_url", &self.images.public_base_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use crate::{Config, TokenConfig};

    #[test]
    fn relative_health_path_is_rejected() {
        let err = Config::from_toml("[server.health]\npath = \"health\"").unwrap_err();
        assert!(err.to_string().contains("server.health.path"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.server.listen_address().port(), 8080);
        assert!(config.server.port_fallback);
        assert_eq!(config.upstream.base_url.as_str(), "https://api.chaton.ai/");
        assert_eq!(config.upstream.max_concurrent_requests, 64);
        assert_eq!(config.chat.fallback_model, "claude-3-5-sonnet");
        assert_eq!(config.images.retention().unwrap(), Duration::from_secs(60));
        assert_eq!(config.imagegen.storage_timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(config.imagegen.download_timeout().unwrap(), Duration::from_secs(30));
        assert!(config.upstream.token.is_none());
        assert!(config.telemetry.is_none());
    }

    #[test]
    fn parses_command_token() {
        let config = Config::from_toml(
            r#"
            [upstream.token]
            type = "command"
            command = "node"
            args = ["sign.js"]
            "#,
        )
        .unwrap();

        let Some(TokenConfig::Command { command, args }) = config.upstream.token else {
            panic!("expected command token");
        };
        assert_eq!(command, "node");
        assert_eq!(args, vec!["sign.js".to_owned()]);
    }

    #[test]
    fn parses_static_token_from_env() {
        temp_env::with_var("PARLEY_TEST_AUTH", Some("Bearer xyz"), || {
            let config = Config::from_toml(
                r#"
                [upstream.token]
                type = "static"
                authorization = "{{ env.PARLEY_TEST_AUTH }}"
                "#,
            )
            .unwrap();

            let Some(TokenConfig::Static { authorization }) = config.upstream.token else {
                panic!("expected static token");
            };
            assert_eq!(authorization.expose_secret(), "Bearer xyz");
        });
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Config::from_toml("[server]\nlisten = \"0.0.0.0:1\"\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn rejects_fallback_outside_models() {
        let err = Config::from_toml(
            r#"
            [chat]
            models = ["gpt-4o"]
            fallback_model = "claude"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("fallback_model"));
    }

    #[test]
    fn rejects_invalid_duration() {
        let err = Config::from_toml("[imagegen]\nstorage_timeout = \"whenever\"\n").unwrap_err();
        assert!(err.to_string().contains("imagegen.storage_timeout"));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let err = Config::from_toml("[upstream]\nmax_concurrent_requests = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_concurrent_requests"));
    }

    #[test]
    fn rejects_non_web_public_base_url() {
        let err = Config::from_toml("[images]\npublic_base_url = \"file:///tmp\"\n").unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "[server]\nlisten_address = \"127.0.0.1:9090\"\nport_fallback = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.listen_address().port(), 9090);
        assert!(!config.server.port_fallback);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(std::path::Path::new("/nonexistent/parley.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
