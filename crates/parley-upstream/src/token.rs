//! Credential generation for upstream payloads
//!
//! The upstream signs every request body, so credentials are produced per
//! payload rather than once per process.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use parley_config::TokenConfig;
use secrecy::SecretString;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Header pair sent with one upstream request
#[derive(Debug, Clone)]
pub struct Credentials {
    /// `Authorization` header value
    pub authorization: SecretString,
    /// `Date` header value the authorization was computed for
    pub date: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no token provider configured")]
    NotConfigured,

    #[error("failed to run token command '{command}': {source}")]
    Spawn { command: String, source: std::io::Error },

    #[error("token command exited with {status}: {stderr}")]
    Exited { status: std::process::ExitStatus, stderr: String },

    #[error("token command output is missing the {0} line")]
    MalformedOutput(&'static str),

    #[error("failed to format request date: {0}")]
    Date(String),
}

/// Produces credentials for an exact payload string
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn authorize(&self, payload: &str) -> Result<Credentials, TokenError>;
}

/// Build the provider described by the config
pub fn from_config(config: Option<&TokenConfig>) -> Arc<dyn TokenProvider> {
    match config {
        Some(TokenConfig::Command { command, args }) => {
            Arc::new(CommandTokenProvider::new(command.clone(), args.clone()))
        }
        Some(TokenConfig::Static { authorization }) => Arc::new(StaticTokenProvider::new(authorization.clone())),
        None => {
            tracing::warn!("no upstream token configured; upstream calls will fail");
            Arc::new(UnconfiguredTokenProvider)
        }
    }
}

/// Runs an external signer
///
/// The payload is written to the program's stdin; the first stdout line is
/// the authorization value and the second the date.
#[derive(Debug, Clone)]
pub struct CommandTokenProvider {
    command: String,
    args: Vec<String>,
}

impl CommandTokenProvider {
    pub const fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }

    fn spawn_error(&self, source: std::io::Error) -> TokenError {
        TokenError::Spawn {
            command: self.command.clone(),
            source,
        }
    }
}

#[async_trait]
impl TokenProvider for CommandTokenProvider {
    async fn authorize(&self, payload: &str) -> Result<Credentials, TokenError> {
        let mut child = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes()).await.map_err(|e| self.spawn_error(e))?;
        }

        let output = child.wait_with_output().await.map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(TokenError::Exited {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines().map(str::trim);

        let authorization = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or(TokenError::MalformedOutput("authorization"))?;
        let date = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or(TokenError::MalformedOutput("date"))?;

        Ok(Credentials {
            authorization: SecretString::from(authorization.to_owned()),
            date: date.to_owned(),
        })
    }
}

/// Fixed authorization dated at request time
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    authorization: SecretString,
}

impl StaticTokenProvider {
    pub const fn new(authorization: SecretString) -> Self {
        Self { authorization }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn authorize(&self, _payload: &str) -> Result<Credentials, TokenError> {
        let date = jiff::fmt::rfc2822::DateTimePrinter::new()
            .timestamp_to_rfc9110_string(&jiff::Timestamp::now())
            .map_err(|e| TokenError::Date(e.to_string()))?;

        Ok(Credentials {
            authorization: self.authorization.clone(),
            date,
        })
    }
}

/// Fails every call
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTokenProvider;

#[async_trait]
impl TokenProvider for UnconfiguredTokenProvider {
    async fn authorize(&self, _payload: &str) -> Result<Credentials, TokenError> {
        Err(TokenError::NotConfigured)
    }
}
