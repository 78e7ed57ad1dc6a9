use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use jktdocs_auth::{NameCollation, TokenAlgorithm};
use jktdocs_infra::RootAccount;
use jktdocs_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEV_ROOT_PASSWORD: &str = "admin123";
/// Ten years; keeps `iat + expiry` well inside the calendar.
pub const MAX_JWT_EXPIRY_SECS: i64 = 315_360_000;

/// Token signing/verification settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub algorithm: TokenAlgorithm,
    /// HS256 shared secret.
    pub secret: String,
    /// RS256 keys (PEM).
    pub public_key_pem: Option<String>,
    pub private_key_pem: Option<String>,
    pub expiry_secs: i64,
    pub issuer: Option<String>,
    pub leeway_secs: i64,
}

// API configuration sourced from environment variables. Read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt: JwtConfig,
    pub root: RootAccount,
    pub documents_dir: PathBuf,
    /// Base for relative document paths recorded in the store.
    pub base_dir: PathBuf,
    pub collation: NameCollation,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let base_dir = std::env::current_dir().with_context(|| "read current working directory")?;
        Self::from_lookup(|key| std::env::var(key).ok(), base_dir)
    }

    /// Build from an arbitrary key lookup; `base_dir` stands in for the working directory.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, base_dir: PathBuf) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("API_PORT").unwrap_or_else(|| "3001".to_string());
        let bind_addr = format!("{host}:{port}")
            .parse()
            .with_context(|| "parse API_HOST/API_PORT")?;

        let algorithm = match var("JWT_ALGORITHM") {
            Some(v) => v.parse::<TokenAlgorithm>().map_err(|e| anyhow!(e)).with_context(|| "parse JWT_ALGORITHM")?,
            None => TokenAlgorithm::Hs256,
        };
        let secret = var("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        let pem = |key: &str| var(key).map(|v| v.replace("\\n", "\n"));
        let public_key_pem = pem("JWT_PUBLIC_KEY");
        let private_key_pem = pem("JWT_PRIVATE_KEY");
        if algorithm == TokenAlgorithm::Rs256 && (public_key_pem.is_none() || private_key_pem.is_none()) {
            return Err(anyhow!("JWT_PUBLIC_KEY and JWT_PRIVATE_KEY are required for RS256"));
        }

        let expiry_secs = parse_or(&var, "JWT_EXPIRY", 3600)?;
        let leeway_secs = parse_or(&var, "JWT_LEEWAY", 0)?;
        if !(1..=MAX_JWT_EXPIRY_SECS).contains(&expiry_secs) {
            return Err(anyhow!("JWT_EXPIRY must be between 1 and {MAX_JWT_EXPIRY_SECS} seconds"));
        }

        let role_name = var("DEFAULT_USER_NAME").unwrap_or_else(|| "admin".to_string());
        let email = var("DEFAULT_USER_EMAIL").unwrap_or_else(|| "admin@jktdocs.local".to_string());
        let password = var("DEFAULT_USER_PASSWORD").unwrap_or_else(|| DEV_ROOT_PASSWORD.to_string());

        let documents_dir = match var("DOCUMENTS_DIR") {
            Some(dir) => base_dir.join(dir),
            None => base_dir.join("shared").join("documents"),
        };

        let collation = if parse_or(&var, "UNIQUE_NAMES_CASE_INSENSITIVE", false)? {
            NameCollation::CaseInsensitive
        } else {
            NameCollation::CaseSensitive
        };

        let log_format = match var("LOG_FORMAT") {
            Some(v) => v.parse().map_err(|e: String| anyhow!(e)).with_context(|| "parse LOG_FORMAT")?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt: JwtConfig {
                algorithm,
                secret,
                public_key_pem,
                private_key_pem,
                expiry_secs,
                issuer: var("JWT_ISSUER"),
                leeway_secs,
            },
            root: RootAccount {
                name: role_name.clone(),
                role_name,
                email,
                password,
            },
            documents_dir,
            base_dir,
            collation,
            log_format,
        })
    }

    /// Warn about dev defaults still in effect. Call once logging is up.
    pub fn warn_insecure_defaults(&self) {
        if self.jwt.algorithm == TokenAlgorithm::Hs256 && self.jwt.secret == DEV_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
        }
        if self.root.password == DEV_ROOT_PASSWORD {
            tracing::warn!("DEFAULT_USER_PASSWORD not set; using insecure dev default");
        }
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(v) => v.trim().parse().with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}
