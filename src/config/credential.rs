//! Credential model: either a previously obtained token or a client registration secret.
//!
//! The persisted form is polymorphic. An `access_token` key selects a token, a
//! `client_id` key selects a client, and an object with nothing in it is an empty
//! credential. Populated keys win over empty ones when both are present. Anything else
//! is rejected instead of being silently dropped.

use crate::error::ConfigError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::{self, IgnoredAny};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Expiry marker for tokens that never expire.
const NO_EXPIRY: &str = "0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    None,
    /// Proves authorization using a token that was already obtained
    Token(TokenCredential),
    /// Used to obtain new tokens through a client credentials grant
    Client(ClientCredential),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCredential {
    pub access_token: String,
    /// e.g. "bearer"
    pub token_type: String,
    pub refresh_token: String,
    /// `None` when the token does not expire
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredential {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Space delimited list of allowable scopes
    #[serde(default)]
    pub scope: String,
}

impl Credential {
    /// Installs a token credential, clearing any client credential.
    pub fn set_token(
        &mut self,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        refresh_token: impl Into<String>,
        expiry: Option<DateTime<Utc>>,
    ) {
        *self = Credential::Token(TokenCredential {
            access_token: access_token.into(),
            token_type: token_type.into(),
            refresh_token: refresh_token.into(),
            expiry: expiry.map(clamp_expiry),
        });
    }

    /// Installs a client credential, clearing any token credential.
    pub fn set_client(
        &mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) {
        *self = Credential::Client(ClientCredential {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Credential::None)
    }

    pub fn token(&self) -> Option<&TokenCredential> {
        match self {
            Credential::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn client(&self) -> Option<&ClientCredential> {
        match self {
            Credential::Client(client) => Some(client),
            _ => None,
        }
    }

    /// True when this credential would replace another one during a merge.
    pub fn is_complete(&self) -> bool {
        match self {
            Credential::Token(token) => !token.access_token.is_empty(),
            Credential::Client(client) => !client.client_id.is_empty(),
            Credential::None => false,
        }
    }

    /// Decodes a credential object handed over by another component, e.g. a token response.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let raw: RawCredential = serde_json::from_value(value)
            .map_err(|e| ConfigError::UnknownCredentialShape(e.to_string()))?;
        raw.into_credential()
    }
}

impl TokenCredential {
    /// Claim set of the access token, decoded WITHOUT verification.
    ///
    /// Diagnostic output only; `None` when the token is not a JWT.
    pub fn claims(&self) -> Option<serde_json::Value> {
        let mut parts = self.access_token.split('.');
        let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn expiry_value(&self) -> String {
        match self.expiry {
            Some(expiry) => clamp_expiry(expiry).to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => NO_EXPIRY.to_string(),
        }
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Credential::None => serializer.serialize_map(Some(0))?.end(),
            Credential::Token(token) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("access_token", &token.access_token)?;
                if !token.token_type.is_empty() {
                    map.serialize_entry("token_type", &token.token_type)?;
                }
                if !token.refresh_token.is_empty() {
                    map.serialize_entry("refresh_token", &token.refresh_token)?;
                }
                map.serialize_entry("expiry", &token.expiry_value())?;
                map.end()
            }
            Credential::Client(client) => client.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawCredential>::deserialize(deserializer)?.unwrap_or_default();
        raw.into_credential().map_err(de::Error::custom)
    }
}

/// Every field either variant may carry, plus whatever else was present.
#[derive(Debug, Default, Deserialize)]
struct RawCredential {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_expiry")]
    expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

impl RawCredential {
    fn into_credential(self) -> Result<Credential, ConfigError> {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

        let token = if filled(&self.access_token) {
            true
        } else if filled(&self.client_id) {
            false
        } else if self.access_token.is_some() {
            true
        } else if self.client_id.is_some() {
            false
        } else {
            return self.into_empty();
        };

        if token {
            Ok(Credential::Token(TokenCredential {
                access_token: self.access_token.unwrap_or_default(),
                token_type: self.token_type.unwrap_or_default(),
                refresh_token: self.refresh_token.unwrap_or_default(),
                expiry: self.expiry.map(clamp_expiry),
            }))
        } else {
            Ok(Credential::Client(ClientCredential {
                client_id: self.client_id.unwrap_or_default(),
                client_secret: self.client_secret.unwrap_or_default(),
                scope: self.scope.unwrap_or_default(),
            }))
        }
    }

    /// Neither selecting key is present; only a bare object is an empty credential.
    fn into_empty(self) -> Result<Credential, ConfigError> {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

        let mut present: Vec<&str> = Vec::new();
        for (key, field) in [
            ("token_type", &self.token_type),
            ("refresh_token", &self.refresh_token),
            ("client_secret", &self.client_secret),
            ("scope", &self.scope),
        ] {
            if filled(field) {
                present.push(key);
            }
        }
        if self.expiry.is_some() {
            present.push("expiry");
        }
        present.extend(self.unknown.keys().map(String::as_str));

        if present.is_empty() {
            Ok(Credential::None)
        } else {
            Err(ConfigError::UnknownCredentialShape(present.join(", ")))
        }
    }
}

/// Pins an expiry into the years RFC 3339 can express (0001 through 9999).
fn clamp_expiry(expiry: DateTime<Utc>) -> DateTime<Utc> {
    let earliest = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).single();
    let latest = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).single();
    match (earliest, latest) {
        (Some(earliest), _) if expiry < earliest => earliest,
        (_, Some(latest)) if expiry > latest => latest,
        _ => expiry,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpiry {
    Text(String),
    Seconds(i64),
}

fn deserialize_expiry<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<RawExpiry>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawExpiry::Text(text)) if text.is_empty() || text == NO_EXPIRY => Ok(None),
        Some(RawExpiry::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| de::Error::custom(format!("invalid token expiry '{}': {}", text, e))),
        Some(RawExpiry::Seconds(0)) => Ok(None),
        Some(RawExpiry::Seconds(secs)) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid token expiry: {}", secs))),
    }
}
