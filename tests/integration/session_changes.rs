//! Integration tests for applying changes through a session and persisting them

use chrono::{TimeZone, Utc};
use optimize_config::config::{
    Change, ConfigPaths, ConfigSession, Environment, FixedClusterName, LoadOptions, NamedList,
    Overrides, Server, TokenCredential,
};
use optimize_config::error::{ConfigError, ReferenceKind};
use std::path::Path;
use tempfile::TempDir;

use crate::integration::write_file;

fn load(path: &Path, overrides: Overrides) -> ConfigSession {
    ConfigSession::load(
        LoadOptions {
            paths: ConfigPaths::explicit(path),
            overrides,
        },
        &FixedClusterName::new("kind-kind"),
    )
    .unwrap()
}

fn token() -> TokenCredential {
    TokenCredential {
        access_token: "access".to_string(),
        token_type: "bearer".to_string(),
        refresh_token: "refresh".to_string(),
        expiry: Some(Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()),
    }
}

#[test]
fn test_login_flow_persists_server_token_and_context() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    let mut session = load(&path, Overrides::default());

    session
        .update_all(vec![
            Change::save_server("dev", Server::default(), Environment::Development),
            Change::save_token("dev", token()),
            Change::apply_current_context("dev", "dev", "dev", "kind-kind"),
        ])
        .unwrap();
    assert_eq!(session.reader().current_context_name(), "dev");
    session.write().unwrap();

    let reloaded = load(&path, Overrides::default());
    let resolved = reloaded.reader().resolve_current().unwrap();
    assert_eq!(resolved.name, "dev");
    assert_eq!(resolved.server.identifier, "https://api.dev-1.dev.gramlabs.dev/");
    assert_eq!(
        resolved.server.authorization.token_endpoint,
        "https://auth.dev-1.dev.gramlabs.dev/oauth/token"
    );
    assert_eq!(resolved.authorization.credential.token(), Some(&token()));
    assert_eq!(resolved.cluster.bin, "kubectl");
}

#[test]
fn test_client_registration_is_written_for_controller() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    let mut session = load(&path, Overrides::default());
    session
        .update(Change::save_client_registration(
            "kind-kind",
            "https://api.stormforge.io/v1/accounts/clients/abc",
            "registration-token",
        ))
        .unwrap();
    session.write().unwrap();

    let reloaded = load(&path, Overrides::default());
    let controller = reloaded.reader().controller("kind-kind").unwrap();
    assert_eq!(
        controller.registration_client_uri,
        "https://api.stormforge.io/v1/accounts/clients/abc"
    );
    assert_eq!(controller.deployment_name, "optimize-controller-manager");
}

#[test]
fn test_failed_change_writes_nothing() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    write_file(&path, "current-context: default\n");

    let mut session = load(&path, Overrides::default());
    let err = session
        .update_all(vec![
            Change::set_property("controller.kind-kind.env.HTTP_PROXY", "http://proxy"),
            Change::set_property("context.default.cluster", "missing"),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnknownReference {
            kind: ReferenceKind::Cluster,
            ..
        }
    ));
    session.write().unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "current-context: default\n"
    );
}

#[test]
fn test_existing_entries_survive_write() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    write_file(
        &path,
        concat!(
            "servers:\n",
            "- name: custom\n",
            "  server:\n",
            "    identifier: https://api.example.com/\n",
            "contexts:\n",
            "- name: custom\n",
            "  context:\n",
            "    server: custom\n",
            "current-context: custom\n",
        ),
    );

    let mut session = load(&path, Overrides::default());
    session
        .update(Change::set_property("controller.kind-kind.env.HTTP_PROXY", "http://proxy"))
        .unwrap();
    session.write().unwrap();

    let reloaded = load(&path, Overrides::default());
    let cfg = reloaded.config();
    assert_eq!(
        cfg.servers.find("custom").unwrap().identifier,
        "https://api.example.com/"
    );
    assert_eq!(
        cfg.servers.find("custom").unwrap().api.experiments_endpoint,
        "https://api.example.com/v1/experiments/"
    );
    assert_eq!(
        cfg.controllers.find("kind-kind").unwrap().env[0].value,
        "http://proxy"
    );
    assert_eq!(cfg.current_context, "custom");
}

#[test]
fn test_invalid_environment_override_fails_load() {
    let test_dir = TempDir::new().unwrap();
    let err = ConfigSession::load(
        LoadOptions {
            paths: ConfigPaths::explicit(test_dir.path().join("config")),
            overrides: Overrides {
                environment: Some("qa".to_string()),
                ..Default::default()
            },
        },
        &FixedClusterName::none(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvironmentAlias(_)));
}

#[test]
fn test_token_with_empty_access_token_reloads() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config");
    let mut session = load(&path, Overrides::default());

    let empty = TokenCredential {
        access_token: String::new(),
        ..token()
    };
    session.update(Change::save_token("dev", empty.clone())).unwrap();
    session.write().unwrap();

    let reloaded = load(&path, Overrides::default());
    let credential = &reloaded.config().authorizations.find("dev").unwrap().credential;
    assert_eq!(credential.token(), Some(&empty));
}
