//! Merge rules for layering one configuration document over another.
//!
//! Scalars: a non-empty overlay value wins, otherwise the base value is kept.
//! Named collections: entries are matched by name (first match), matched entries are
//! merged field by field and overlay-only entries are appended in overlay order.
//! Credentials are the exception: they are replaced wholesale or not at all.

use crate::config::types::{
    Authorization, Cluster, Config, Context, Controller, ControllerEnvVar, Named, Server,
};
use std::collections::HashMap;

/// Field-level merge of an overlay value into `self`.
pub trait Merge {
    fn merge_from(&mut self, overlay: &Self);
}

/// Entries that are matched by a string key when merging sequences.
trait Keyed {
    fn key(&self) -> &str;
}

impl<T> Keyed for Named<T> {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for ControllerEnvVar {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Overwrites `base` with `overlay` when the overlay is non-empty.
pub(crate) fn merge_string(base: &mut String, overlay: &str) {
    if !overlay.is_empty() {
        *base = overlay.to_string();
    }
}

/// Merges `overlay` into `base` by key.
///
/// Only the first overlay entry for a key is considered, and only the first base entry
/// with that key receives it.
fn merge_keyed<E: Keyed + Clone>(base: &mut Vec<E>, overlay: &[E], merge: impl Fn(&mut E, &E)) {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(overlay.len());
    let mut pending: Vec<Option<&E>> = Vec::with_capacity(overlay.len());
    for entry in overlay {
        index.entry(entry.key()).or_insert_with(|| {
            pending.push(Some(entry));
            pending.len() - 1
        });
    }

    for existing in base.iter_mut() {
        if let Some(&slot) = index.get(existing.key()) {
            if let Some(entry) = pending[slot].take() {
                merge(existing, entry);
            }
        }
    }

    base.extend(pending.into_iter().flatten().cloned());
}

/// Merges a named collection overlay into `base`.
pub fn merge_named<T: Merge + Clone>(base: &mut Vec<Named<T>>, overlay: &[Named<T>]) {
    merge_keyed(base, overlay, |b, o| b.body.merge_from(&o.body));
}

impl Config {
    /// Layers `overlay` on top of this configuration.
    pub fn merge(&mut self, overlay: &Config) {
        merge_named(&mut self.servers, &overlay.servers);
        merge_named(&mut self.authorizations, &overlay.authorizations);
        merge_named(&mut self.clusters, &overlay.clusters);
        merge_named(&mut self.controllers, &overlay.controllers);
        merge_named(&mut self.contexts, &overlay.contexts);
        merge_string(&mut self.current_context, &overlay.current_context);
        merge_string(&mut self.environment, &overlay.environment);
    }
}

impl Merge for Server {
    fn merge_from(&mut self, o: &Self) {
        merge_string(&mut self.identifier, &o.identifier);

        let (api, oapi) = (&mut self.api, &o.api);
        merge_string(&mut api.applications_endpoint, &oapi.applications_endpoint);
        merge_string(&mut api.experiments_endpoint, &oapi.experiments_endpoint);
        merge_string(&mut api.accounts_endpoint, &oapi.accounts_endpoint);
        merge_string(&mut api.performance_token_endpoint, &oapi.performance_token_endpoint);
        merge_string(
            &mut api.registry_registration_endpoint,
            &oapi.registry_registration_endpoint,
        );

        let (az, oaz) = (&mut self.authorization, &o.authorization);
        merge_string(&mut az.issuer, &oaz.issuer);
        merge_string(&mut az.authorization_endpoint, &oaz.authorization_endpoint);
        merge_string(&mut az.token_endpoint, &oaz.token_endpoint);
        merge_string(&mut az.revocation_endpoint, &oaz.revocation_endpoint);
        merge_string(&mut az.registration_endpoint, &oaz.registration_endpoint);
        merge_string(
            &mut az.device_authorization_endpoint,
            &oaz.device_authorization_endpoint,
        );
        merge_string(&mut az.json_web_key_set_uri, &oaz.json_web_key_set_uri);

        merge_string(&mut self.application.base_url, &o.application.base_url);
        merge_string(
            &mut self.application.auth_success_endpoint,
            &o.application.auth_success_endpoint,
        );
    }
}

impl Merge for Authorization {
    fn merge_from(&mut self, o: &Self) {
        // Partial credentials are never combined
        if o.credential.is_complete() {
            self.credential = o.credential.clone();
        }
    }
}

impl Merge for Cluster {
    fn merge_from(&mut self, o: &Self) {
        merge_string(&mut self.kube_config, &o.kube_config);
        merge_string(&mut self.context, &o.context);
        merge_string(&mut self.namespace, &o.namespace);
        merge_string(&mut self.bin, &o.bin);
        merge_string(&mut self.controller, &o.controller);
    }
}

impl Merge for Controller {
    fn merge_from(&mut self, o: &Self) {
        merge_string(&mut self.deployment_name, &o.deployment_name);
        merge_string(&mut self.namespace, &o.namespace);
        merge_string(&mut self.registration_client_uri, &o.registration_client_uri);
        merge_string(&mut self.registration_access_token, &o.registration_access_token);
        merge_keyed(&mut self.env, &o.env, |b, o| merge_string(&mut b.value, &o.value));
    }
}

impl Merge for Context {
    fn merge_from(&mut self, o: &Self) {
        merge_string(&mut self.server, &o.server);
        merge_string(&mut self.authorization, &o.authorization);
        merge_string(&mut self.cluster, &o.cluster);
    }
}
