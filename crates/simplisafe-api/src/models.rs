// SimpliSafe mobile API response models
//
// Only the fields the bridge reads are modelled; everything else in the
// vendor JSON is ignored by serde. Fields are optional where the vendor
// has been seen to omit them, and callers decide what "missing" means.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// `return_code` value signalling a successful login.
pub const LOGIN_SUCCESS: i64 = 1;
/// `return_code` value signalling rejected credentials.
pub const LOGIN_INVALID_CREDENTIALS: i64 = 0;

/// Body of `POST /mobile/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "int_or_numeric_string")]
    pub return_code: Option<i64>,
    pub session: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub uid: Option<String>,
    pub username: Option<String>,
}

/// Body of `POST /mobile/{uid}/locations`.
///
/// Only the keys of `locations` matter: each key is a base station's
/// location id. The per-location payload is kept opaque.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub locations: Option<BTreeMap<String, serde_json::Value>>,
}

impl LocationsResponse {
    /// Location ids in the response, in key order.
    pub fn location_ids(&self) -> impl Iterator<Item = &str> {
        self.locations
            .iter()
            .flat_map(|m| m.keys())
            .map(String::as_str)
    }
}

/// Body of both `get-state` and `set-state`.
#[derive(Debug, Clone, Deserialize)]
pub struct StateResponse {
    #[serde(default, deserialize_with = "int_or_numeric_string")]
    pub response_code: Option<i64>,
}

/// Parse a JSON body, keeping the raw text on failure.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::deserialization(&e, body))
}

/// The vendor's three operating modes for a base station.
///
/// The bridge only ever requests `Home` or `Away`; `Off` is reachable
/// from the keypad or the vendor app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmMode {
    Off,
    Home,
    Away,
}

impl AlarmMode {
    pub const OFF_CODE: i64 = 2;
    pub const HOME_CODE: i64 = 4;
    pub const AWAY_CODE: i64 = 5;

    /// Mode requested for a boolean "armed" value.
    pub fn for_armed(armed: bool) -> Self {
        if armed { Self::Away } else { Self::Home }
    }

    /// Decode a state `response_code`. Unknown codes yield `None`.
    pub fn from_response_code(code: i64) -> Option<Self> {
        match code {
            Self::OFF_CODE => Some(Self::Off),
            Self::HOME_CODE => Some(Self::Home),
            Self::AWAY_CODE => Some(Self::Away),
            _ => None,
        }
    }

    /// Wire value for the `state` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

impl fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The vendor returns `uid` as a number on some accounts and a string on others.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Status codes arrive as `5` or `"5"`. Anything else non-null is an error.
fn int_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer code, got {n}"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer code, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!(
            "expected an integer code, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn login_response_accepts_numeric_uid() {
        let resp: LoginResponse = parse_body(
            r#"{"return_code":1,"session":"s3cr3t","uid":1234,"username":"bob"}"#,
        )
        .unwrap();
        assert_eq!(resp.return_code, Some(LOGIN_SUCCESS));
        assert_eq!(resp.uid.as_deref(), Some("1234"));
        assert_eq!(resp.session.as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn codes_accept_numeric_strings() {
        let login: LoginResponse = parse_body(r#"{"return_code":"1","uid":"7"}"#).unwrap();
        assert_eq!(login.return_code, Some(LOGIN_SUCCESS));

        let state: StateResponse = parse_body(r#"{"response_code":" 5 "}"#).unwrap();
        assert_eq!(state.response_code, Some(AlarmMode::AWAY_CODE));

        let state: StateResponse = parse_body(r#"{"response_code":null}"#).unwrap();
        assert_eq!(state.response_code, None);

        assert!(parse_body::<StateResponse>(r#"{"response_code":"away"}"#).is_err());
        assert!(parse_body::<StateResponse>(r#"{"response_code":true}"#).is_err());
    }

    #[test]
    fn locations_response_lists_keys() {
        let resp: LocationsResponse =
            parse_body(r#"{"locations":{"B2":{"street":"x"},"A1":{}}}"#).unwrap();
        let ids: Vec<&str> = resp.location_ids().collect();
        assert_eq!(ids, vec!["A1", "B2"]);
    }

    #[test]
    fn locations_response_tolerates_missing_map() {
        let resp: LocationsResponse = parse_body("{}").unwrap();
        assert_eq!(resp.location_ids().count(), 0);
    }

    #[test]
    fn malformed_body_keeps_raw_text() {
        let err = parse_body::<StateResponse>("not json").unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn alarm_mode_codes() {
        assert_eq!(AlarmMode::from_response_code(5), Some(AlarmMode::Away));
        assert_eq!(AlarmMode::from_response_code(4), Some(AlarmMode::Home));
        assert_eq!(AlarmMode::from_response_code(2), Some(AlarmMode::Off));
        assert_eq!(AlarmMode::from_response_code(99), None);
        assert_eq!(AlarmMode::for_armed(true).as_str(), "away");
        assert_eq!(AlarmMode::for_armed(false).as_str(), "home");
    }
}
