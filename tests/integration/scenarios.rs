//! End-to-end resolution scenarios against the public API

use optimize_config::config::{
    self, apply_all, Change, Config, Context, Controller, ControllerEnvVar, Credential, Named,
    NamedList, Server, TokenCredential,
};
use optimize_config::error::{ConfigError, ReferenceKind};

#[test]
fn test_empty_staging_config_resolves_single_defaults() {
    let mut cfg = Config {
        environment: "staging".to_string(),
        ..Default::default()
    };
    config::resolve(&mut cfg, "default").unwrap();

    assert_eq!(cfg.servers[0].body.identifier, "https://api.stormforge.dev/");
    assert_eq!(cfg.authorizations.names(), vec!["default".to_string()]);
    assert_eq!(cfg.clusters.names(), vec!["default".to_string()]);
    assert_eq!(cfg.contexts.names(), vec!["default".to_string()]);
}

#[test]
fn test_discovered_cluster_name_seeds_clusters() {
    let mut cfg = Config::default();
    config::resolve(&mut cfg, "gke_project_zone_cluster").unwrap();
    assert_eq!(
        cfg.clusters.names(),
        vec!["gke_project_zone_cluster".to_string()]
    );
    assert_eq!(cfg.contexts[0].body.cluster, "gke_project_zone_cluster");
}

#[test]
fn test_set_production_is_never_persisted() {
    let cfg = Config {
        environment: "development".to_string(),
        ..Default::default()
    };
    let cfg = Change::set_execution_environment("PROD").apply(cfg).unwrap();
    assert_eq!(cfg.environment, "");
}

#[test]
fn test_unknown_server_reference_leaves_config_unchanged() {
    let cfg = Config {
        contexts: vec![Named::new("foo", Context::default())],
        ..Default::default()
    };
    let original = cfg.clone();
    let changes = vec![Change::set_property("context.foo.server", "nosuch")];
    let err = apply_all(cfg.clone(), &changes).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnknownReference { kind: ReferenceKind::Server, ref name } if name == "nosuch"
    ));
    assert_eq!(cfg, original);
}

#[test]
fn test_controller_env_merge() {
    let mut base = Config {
        controllers: vec![Named::new(
            "kind",
            Controller {
                env: vec![ControllerEnvVar::new("A", "1"), ControllerEnvVar::new("B", "2")],
                ..Default::default()
            },
        )],
        ..Default::default()
    };
    let overlay = Config {
        controllers: vec![Named::new(
            "kind",
            Controller {
                env: vec![ControllerEnvVar::new("B", "9"), ControllerEnvVar::new("C", "3")],
                ..Default::default()
            },
        )],
        ..Default::default()
    };
    base.merge(&overlay);
    assert_eq!(
        base.controllers.find("kind").unwrap().env,
        vec![
            ControllerEnvVar::new("A", "1"),
            ControllerEnvVar::new("B", "9"),
            ControllerEnvVar::new("C", "3"),
        ]
    );
}

#[test]
fn test_name_match_wins_over_single_entry() {
    let mut cfg = Config {
        servers: vec![Named::new("work", Server::default())],
        authorizations: vec![
            Named::new("work", Default::default()),
            Named::new("personal", Default::default()),
        ],
        contexts: vec![Named::new("work", Context::default())],
        ..Default::default()
    };
    config::resolve(&mut cfg, "default").unwrap();
    let ctx = cfg.contexts.find("work").unwrap();
    assert_eq!(ctx.server, "work");
    assert_eq!(ctx.authorization, "work");
}

#[test]
fn test_credential_is_replaced_wholesale_on_merge() {
    let mut base = Config::default();
    base.authorizations.upsert("default").credential.set_token(
        "old-access",
        "bearer",
        "old-refresh",
        None,
    );

    let mut overlay = Config::default();
    overlay
        .authorizations
        .upsert("default")
        .credential
        .set_client("client", "secret", "register:clients");
    base.merge(&overlay);

    let credential = &base.authorizations.find("default").unwrap().credential;
    assert!(credential.token().is_none());
    assert_eq!(credential.client().unwrap().client_id, "client");

    // An empty overlay credential never clears the base
    let empty = Config {
        authorizations: vec![Named::new("default", Default::default())],
        ..Default::default()
    };
    base.merge(&empty);
    assert!(base.authorizations.find("default").unwrap().credential.client().is_some());
}

#[test]
fn test_credential_round_trip_through_document() {
    let mut cfg = Config::default();
    cfg.authorizations.upsert("token").credential = Credential::Token(TokenCredential {
        access_token: "a.b.c".to_string(),
        token_type: "bearer".to_string(),
        refresh_token: "refresh".to_string(),
        expiry: chrono::DateTime::parse_from_rfc3339("2031-05-06T07:08:09Z")
            .ok()
            .map(|t| t.with_timezone(&chrono::Utc)),
    });
    cfg.authorizations
        .upsert("client")
        .credential
        .set_client("id", "secret", "");
    cfg.authorizations.upsert("empty");

    let yaml = serde_yaml::to_string(&cfg).unwrap();
    let decoded = config::parse(&yaml, std::path::Path::new("inline")).unwrap();
    assert_eq!(decoded, cfg);
}
