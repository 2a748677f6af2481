use serde::{Deserialize, Serialize};

use crate::models::status_model::CountryStatus;

/// Cuerpo opcional de POST /check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub force_notify_test: bool,
    #[serde(default)]
    pub test_notify_token: Option<String>,
}

/// Resultado plano de una corrida. Los booleanos se serializan como
/// "true"/"false" en minúsculas (así los consume el proxy existente).
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: Option<CountryStatus>,
    pub previous_status: Option<CountryStatus>,
    #[serde(serialize_with = "serialize_bool_str")]
    pub changed: bool,
    #[serde(serialize_with = "serialize_bool_str")]
    pub notified: bool,
    pub provider: Option<String>,
    pub provider_message_id: Option<String>,
    pub raw_excerpt: Option<String>,
    pub action: Option<&'static str>,
    pub error: Option<String>,
    pub notify_error: Option<String>,
    pub mode: &'static str,
    #[serde(serialize_with = "serialize_bool_str")]
    pub test_mode: bool,
}

fn serialize_bool_str<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(if *value { "true" } else { "false" })
}
