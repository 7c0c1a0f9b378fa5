// Configuration - environment-style settings shared by the binaries

use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_STORAGE_ROOT: &str = "~/.csvjob/objects";

/// Which ledger implementation backs the idempotency coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdempotencyBackend {
    /// Process-local map; lost on restart
    #[default]
    InMemory,
    /// Shared SQLite table
    Durable,
}

impl FromStr for IdempotencyBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "IN_MEMORY" => Ok(Self::InMemory),
            "DURABLE" => Ok(Self::Durable),
            other => Err(AppError::Config(format!(
                "IDP_MODE must be IN_MEMORY or DURABLE, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for IdempotencyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => write!(f, "IN_MEMORY"),
            Self::Durable => write!(f, "DURABLE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOCAL" => Ok(Self::Local),
            "S3" => Ok(Self::S3),
            other => Err(AppError::Config(format!(
                "STORAGE_BACKEND must be LOCAL or S3, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "LOCAL"),
            Self::S3 => write!(f, "S3"),
        }
    }
}

/// Settings read once at startup
///
/// Optional values stay `None` until a component asks for them through a
/// `require_*` accessor, so a binary fails only on what it actually needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub input_bucket: Option<String>,
    pub output_bucket: Option<String>,
    pub job_queue_url: Option<String>,
    pub aws_region: String,
    pub s3_endpoint: Option<String>,
    pub storage_backend: StorageBackend,
    pub storage_root: String,
    pub idempotency_backend: IdempotencyBackend,
    pub ledger_database_url: Option<String>,
    pub ledger_table_name: Option<String>,
    pub exclude_header: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_map(&std::env::vars().collect())
    }

    /// Build from an explicit variable map (tests, embedding)
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_backend = get("STORAGE_BACKEND")
            .map(|v| v.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or_default();
        let idempotency_backend = get("IDP_MODE")
            .map(|v| v.parse::<IdempotencyBackend>())
            .transpose()?
            .unwrap_or_default();
        let exclude_header = get("EXCLUDE_HEADER")
            .map(|v| parse_bool("EXCLUDE_HEADER", &v))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            input_bucket: get("INPUT_BUCKET"),
            output_bucket: get("OUTPUT_BUCKET"),
            job_queue_url: get("JOB_QUEUE_URL"),
            aws_region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            s3_endpoint: get("S3_ENDPOINT"),
            storage_backend,
            storage_root: get("STORAGE_ROOT").unwrap_or_else(|| DEFAULT_STORAGE_ROOT.to_string()),
            idempotency_backend,
            ledger_database_url: get("LEDGER_DATABASE_URL"),
            ledger_table_name: get("LEDGER_TABLE_NAME"),
            exclude_header,
        })
    }

    pub fn require_output_bucket(&self) -> Result<&str> {
        require(&self.output_bucket, "OUTPUT_BUCKET")
    }

    pub fn require_input_bucket(&self) -> Result<&str> {
        require(&self.input_bucket, "INPUT_BUCKET")
    }

    pub fn require_job_queue_url(&self) -> Result<&str> {
        require(&self.job_queue_url, "JOB_QUEUE_URL")
    }

    /// Ledger database, falling back to the queue database
    pub fn ledger_database_url(&self) -> Result<&str> {
        match &self.ledger_database_url {
            Some(url) => Ok(url),
            None => self.require_job_queue_url(),
        }
    }

    /// Table name for the durable ledger; must be a plain SQL identifier
    pub fn require_ledger_table(&self) -> Result<&str> {
        let table = require(&self.ledger_table_name, "LEDGER_TABLE_NAME")?;
        validate_identifier(table)?;
        Ok(table)
    }

    /// Fails early when DURABLE mode is selected without its settings
    pub fn validate(&self) -> Result<()> {
        if self.idempotency_backend == IdempotencyBackend::Durable {
            self.require_ledger_table()?;
            self.ledger_database_url()?;
        }
        Ok(())
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| AppError::Config(format!("{} is not set", name)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}

/// Identifiers are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` passes
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Config(format!("invalid table name '{}'", name)))
    }
}
