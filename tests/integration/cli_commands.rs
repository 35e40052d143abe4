//! Integration tests for the optimize-config command surface

use clap::Parser;
use optimize_config::cli::{Cli, Commands, RunContext};
use optimize_config::config::{FixedClusterName, Format, Overrides};
use std::path::Path;
use tempfile::TempDir;

use crate::integration::write_file;

fn run(config: &Path, args: &[&str]) -> Result<String, optimize_config::error::ConfigError> {
    let config_arg = config.to_string_lossy().to_string();
    let mut argv = vec!["optimize-config", "--config", config_arg.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let overrides = Overrides {
        environment: cli.env.clone(),
        context: cli.context.clone(),
    };
    let mut context =
        RunContext::with_probe(cli.config.clone(), overrides, &FixedClusterName::new("kind"))?;
    context.execute(&cli.command)
}

const TWO_CONTEXTS: &str = concat!(
    "servers:\n",
    "- name: default\n",
    "  server: {}\n",
    "- name: staging\n",
    "  server:\n",
    "    identifier: https://api.stormforge.dev/\n",
    "    authorization:\n",
    "      issuer: https://auth.stormforge.dev/\n",
    "contexts:\n",
    "- name: default\n",
    "  context: {}\n",
    "- name: staging\n",
    "  context:\n",
    "    server: staging\n",
    "current-context: default\n",
);

#[test]
fn test_parse_view_flags() {
    let cli = Cli::try_parse_from([
        "optimize-config",
        "view",
        "--minify",
        "-o",
        "json",
        "--decode-jwt",
    ])
    .unwrap();
    assert_eq!(
        cli.command,
        Commands::View {
            minify: true,
            raw: false,
            output: Format::Json,
            decode_jwt: true,
        }
    );
    assert!(Cli::try_parse_from(["optimize-config", "view", "--minify", "--raw"]).is_err());
    assert!(Cli::try_parse_from(["optimize-config", "view", "-o", "toml"]).is_err());
}

#[test]
fn test_use_context_switches_and_persists() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    write_file(&path, TWO_CONTEXTS);

    assert_eq!(run(&path, &["current-context"]).unwrap(), "default");
    let out = run(&path, &["use-context", "staging"]).unwrap();
    assert!(out.contains("staging"));
    assert_eq!(run(&path, &["current-context"]).unwrap(), "staging");
}

#[test]
fn test_context_flag_does_not_persist() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    write_file(&path, TWO_CONTEXTS);

    assert_eq!(
        run(&path, &["--context", "staging", "current-context"]).unwrap(),
        "staging"
    );
    assert_eq!(run(&path, &["current-context"]).unwrap(), "default");
}

#[test]
fn test_get_contexts_lists_all() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    write_file(&path, TWO_CONTEXTS);

    let out = run(&path, &["get-contexts"]).unwrap();
    assert!(out.contains("default"));
    assert!(out.contains("staging"));
    assert!(out.contains("kind"));
}

#[test]
fn test_view_renders_json_with_defaults() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");

    let out = run(&path, &["--env", "stage", "view", "--output", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        value["servers"][0]["server"]["identifier"],
        "https://api.stormforge.dev/"
    );
    assert_eq!(value["current-context"], "default");
    assert!(value.get("env").is_none());
}

#[test]
fn test_set_unknown_property_fails() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    let err = run(&path, &["set", "servers.default.identifier", "x"]).unwrap_err();
    assert_eq!(
        optimize_config::cli::map_error(&err),
        "error: unknown config property: servers.default.identifier"
    );
    assert!(!path.exists());
}
