use gsheets_mcp::config::{CliArgs, ServerConfig, TransportKind};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(extension: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_apply_without_file_or_flags() {
    let config = ServerConfig::from_args(CliArgs::default()).expect("config builds");

    assert_eq!(config.transport, TransportKind::Stdio);
    assert_eq!(config.http_bind_address.to_string(), "127.0.0.1:8079");
    assert!(config.default_folder_id.is_none());
    assert!(config.enabled_tools.is_none());
    assert!(config.credentials.client_email.is_none());
}

#[test]
fn yaml_file_populates_settings() {
    let file = write_config(
        "yaml",
        "transport: http\n\
         http_bind: 0.0.0.0:9000\n\
         drive_folder_id: folder-abc\n\
         enabled_tools:\n  - List_Sheets\n  - get_sheet_data\n",
    );

    let args = CliArgs {
        config: Some(file.path().to_path_buf()),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).expect("config builds");

    assert_eq!(config.transport, TransportKind::Http);
    assert_eq!(config.http_bind_address.to_string(), "0.0.0.0:9000");
    assert_eq!(config.default_folder_id.as_deref(), Some("folder-abc"));
    // Tool names are normalized to lowercase.
    assert!(config.is_tool_enabled("list_sheets"));
    assert!(config.is_tool_enabled("GET_SHEET_DATA"));
    assert!(!config.is_tool_enabled("batch_update"));
}

#[test]
fn cli_flags_override_file_values() {
    let file = write_config("json", r#"{ "transport": "http", "drive_folder_id": "from-file" }"#);

    let args = CliArgs {
        config: Some(file.path().to_path_buf()),
        transport: Some(TransportKind::Stdio),
        drive_folder_id: Some("from-cli".to_string()),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).expect("config builds");

    assert_eq!(config.transport, TransportKind::Stdio);
    assert_eq!(config.default_folder_id.as_deref(), Some("from-cli"));
}

#[test]
fn blank_folder_id_is_treated_as_absent() {
    let args = CliArgs {
        drive_folder_id: Some("   ".to_string()),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).expect("config builds");

    assert!(config.default_folder_id.is_none());
}

#[test]
fn all_tools_enabled_when_no_allowlist() {
    let config = ServerConfig::from_args(CliArgs::default()).expect("config builds");
    assert!(config.is_tool_enabled("share_spreadsheet"));
    assert!(config.is_tool_enabled("anything"));
}

#[test]
fn missing_config_file_is_an_error() {
    let args = CliArgs {
        config: Some("/nonexistent/gsheets.yaml".into()),
        ..CliArgs::default()
    };
    assert!(ServerConfig::from_args(args).is_err());
}

#[test]
fn unsupported_extension_is_an_error() {
    let file = write_config("toml", "transport = \"http\"\n");
    let args = CliArgs {
        config: Some(file.path().to_path_buf()),
        ..CliArgs::default()
    };
    let error = ServerConfig::from_args(args).expect_err("toml rejected");
    assert!(error.to_string().contains("unsupported config extension"));
}
