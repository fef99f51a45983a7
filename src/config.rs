use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8079";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[value(alias = "stream-http", alias = "stream_http")]
    #[serde(alias = "stream-http", alias = "stream_http")]
    Http,
    Stdio,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Http => write!(f, "http"),
            TransportKind::Stdio => write!(f, "stdio"),
        }
    }
}

/// Raw credential material as supplied by the environment. Resolution
/// order and semantics live in [`crate::auth::resolve_service_account`].
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Base64-encoded service account JSON (CREDENTIALS_CONFIG).
    pub credentials_config: Option<String>,
    /// Raw service account JSON (GOOGLE_SERVICE_ACCOUNT_KEY).
    pub service_account_key: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub credentials: CredentialSources,
    pub default_folder_id: Option<String>,
    pub enabled_tools: Option<HashSet<String>>,
    pub transport: TransportKind,
    pub http_bind_address: SocketAddr,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            credentials_config: cli_credentials_config,
            service_account_key: cli_service_account_key,
            client_email: cli_client_email,
            private_key: cli_private_key,
            project_id: cli_project_id,
            drive_folder_id: cli_drive_folder_id,
            enabled_tools: cli_enabled_tools,
            transport: cli_transport,
            http_bind: cli_http_bind,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            credentials_config: file_credentials_config,
            service_account_key: file_service_account_key,
            client_email: file_client_email,
            private_key: file_private_key,
            project_id: file_project_id,
            drive_folder_id: file_drive_folder_id,
            enabled_tools: file_enabled_tools,
            transport: file_transport,
            http_bind: file_http_bind,
        } = file_config;

        let credentials = CredentialSources {
            credentials_config: cli_credentials_config.or(file_credentials_config),
            service_account_key: cli_service_account_key.or(file_service_account_key),
            client_email: cli_client_email.or(file_client_email),
            private_key: cli_private_key.or(file_private_key),
            project_id: cli_project_id.or(file_project_id),
        };

        let default_folder_id = cli_drive_folder_id
            .or(file_drive_folder_id)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let enabled_tools = cli_enabled_tools
            .or(file_enabled_tools)
            .map(|tools| {
                tools
                    .into_iter()
                    .map(|tool| tool.trim().to_ascii_lowercase())
                    .filter(|tool| !tool.is_empty())
                    .collect::<HashSet<_>>()
            })
            .filter(|set| !set.is_empty());

        let transport = cli_transport
            .or(file_transport)
            .unwrap_or(TransportKind::Stdio);

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        Ok(Self {
            credentials,
            default_folder_id,
            enabled_tools,
            transport,
            http_bind_address,
        })
    }

    pub fn is_tool_enabled(&self, tool: &str) -> bool {
        match &self.enabled_tools {
            Some(set) => set.contains(&tool.to_ascii_lowercase()),
            None => true,
        }
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "gsheets-mcp", about = "Google Sheets MCP server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CREDENTIALS_CONFIG",
        value_name = "B64",
        hide_env_values = true,
        help = "Base64-encoded service account JSON"
    )]
    pub credentials_config: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_SERVICE_ACCOUNT_KEY",
        value_name = "JSON",
        hide_env_values = true,
        help = "Service account credentials as a raw JSON string"
    )]
    pub service_account_key: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_CLIENT_EMAIL",
        value_name = "EMAIL",
        help = "Service account email (used with --private-key)"
    )]
    pub client_email: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_PRIVATE_KEY",
        value_name = "PEM",
        hide_env_values = true,
        help = "Service account private key (literal \\n sequences are unescaped)"
    )]
    pub private_key: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_PROJECT_ID",
        value_name = "ID",
        help = "Google Cloud project id (optional with --client-email)"
    )]
    pub project_id: Option<String>,

    #[arg(
        long,
        env = "DRIVE_FOLDER_ID",
        value_name = "ID",
        help = "Default Drive folder for created and listed spreadsheets"
    )]
    pub drive_folder_id: Option<String>,

    #[arg(
        long,
        env = "GSHEETS_MCP_ENABLED_TOOLS",
        value_name = "TOOL",
        value_delimiter = ',',
        help = "Restrict execution to the provided tool names"
    )]
    pub enabled_tools: Option<Vec<String>>,

    #[arg(
        long,
        env = "GSHEETS_MCP_TRANSPORT",
        value_enum,
        value_name = "TRANSPORT",
        help = "Transport to expose (http or stdio)"
    )]
    pub transport: Option<TransportKind>,

    #[arg(
        long,
        env = "GSHEETS_MCP_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address when using http transport"
    )]
    pub http_bind: Option<SocketAddr>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    credentials_config: Option<String>,
    service_account_key: Option<String>,
    client_email: Option<String>,
    private_key: Option<String>,
    project_id: Option<String>,
    drive_folder_id: Option<String>,
    enabled_tools: Option<Vec<String>>,
    transport: Option<TransportKind>,
    http_bind: Option<SocketAddr>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
