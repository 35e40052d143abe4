//! Integration tests for locating, reading and writing the configuration file

use optimize_config::config::{
    Change, ConfigPaths, ConfigSession, FixedClusterName, LoadOptions, NamedList, Overrides,
};
use optimize_config::error::ConfigError;
use tempfile::TempDir;

use crate::integration::{with_xdg_env, write_file};

fn load_from_env() -> Result<ConfigSession, ConfigError> {
    ConfigSession::load(LoadOptions::from_env(), &FixedClusterName::none())
}

#[test]
fn test_missing_file_loads_defaults() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, |dirs| {
        let session = load_from_env().unwrap();
        assert_eq!(session.paths().read, dirs.user_file());
        assert_eq!(session.paths().write, dirs.user_file());
        assert_eq!(session.config().contexts.names(), vec!["default".to_string()]);
        assert!(!dirs.user_file().exists());
    });
}

#[test]
fn test_system_file_is_read_and_user_file_is_written() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, |dirs| {
        write_file(
            &dirs.system_file(),
            "clusters:\n- name: shared\n  cluster:\n    namespace: team\n",
        );

        let mut session = load_from_env().unwrap();
        assert_eq!(session.paths().read, dirs.system_file());
        assert_eq!(session.config().clusters.find("shared").unwrap().namespace, "team");

        session
            .update(Change::set_property("current-context", "default"))
            .unwrap();
        session.write().unwrap();

        assert!(dirs.user_file().is_file());
        let system = std::fs::read_to_string(dirs.system_file()).unwrap();
        assert!(!system.contains("current-context"));
    });
}

#[test]
fn test_json_document_is_accepted() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, |dirs| {
        write_file(
            &dirs.user_file(),
            r#"{"env": "staging", "servers": [{"name": "default", "server": {}}]}"#,
        );
        let session = load_from_env().unwrap();
        assert_eq!(
            session.config().servers.find("default").unwrap().identifier,
            "https://api.stormforge.dev/"
        );
    });
}

#[test]
fn test_malformed_file_fails_load() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, |dirs| {
        write_file(&dirs.user_file(), "servers:\n  - name: [\n");
        let err = load_from_env().unwrap_err();
        match err {
            ConfigError::MalformedDocument { path, .. } => assert_eq!(path, dirs.user_file()),
            other => panic!("unexpected error: {other}"),
        }
    });
}

#[test]
fn test_unknown_stored_environment_fails_load() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("config.yaml");
    write_file(&path, "env: qa\n");
    let err = ConfigSession::load(
        LoadOptions {
            paths: ConfigPaths::explicit(&path),
            overrides: Overrides::default(),
        },
        &FixedClusterName::none(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnresolvableEnvironment(ref env) if env == "qa"));
}

#[test]
fn test_written_document_omits_defaults() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("stormforge").join("config");
    let mut session = ConfigSession::load(
        LoadOptions {
            paths: ConfigPaths::explicit(&path),
            overrides: Overrides::default(),
        },
        &FixedClusterName::new("kind-kind"),
    )
    .unwrap();
    session.update(Change::set_execution_environment("dev")).unwrap();
    session.write().unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.trim(), "env: development");
}

#[cfg(unix)]
#[test]
fn test_written_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, |dirs| {
        let mut session = load_from_env().unwrap();
        session
            .update(Change::set_property("current-context", "default"))
            .unwrap();
        session.write().unwrap();

        let mode = std::fs::metadata(dirs.user_file())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        let dir_mode = std::fs::metadata(dirs.user_file().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    });
}
