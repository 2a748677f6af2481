use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado del cupo de visas para un país.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryStatus {
    Open,
    Paused,
    Closed,
}

impl CountryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountryStatus::Open => "open",
            CountryStatus::Paused => "paused",
            CountryStatus::Closed => "closed",
        }
    }

    /// Normaliza el texto de una celda a un estado canónico.
    /// Match por substring, insensible a mayúsculas; cualquier otra
    /// etiqueta queda como no reconocida (None).
    pub fn from_label(text: &str) -> Option<CountryStatus> {
        let t = text.trim().to_lowercase();
        if t.contains("open") {
            return Some(CountryStatus::Open);
        }
        if t.contains("pause") {
            return Some(CountryStatus::Paused);
        }
        if t.contains("close") {
            return Some(CountryStatus::Closed);
        }
        None
    }
}

impl fmt::Display for CountryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lo que devuelve el Status Source: exactamente uno de `status` o
/// `error` tiene significado; un país no encontrado llega como `error`.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: Option<CountryStatus>,
    pub raw_excerpt: Option<String>,
    pub error: Option<String>,
}

/// Fila de country_last_state (una por país, mutable).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastState {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<CountryStatus>,
    #[serde(default)]
    pub last_checked_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub last_notified_status: Option<CountryStatus>,
}

// Una fila vieja puede traer una etiqueta que ya no reconocemos;
// se trata como ausencia en vez de romper la deserialización.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<CountryStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(CountryStatus::from_label))
}

/// Fila de status_checks (append-only, se escribe en cada corrida).
#[derive(Debug, Clone, Serialize)]
pub struct StatusCheckRecord {
    pub country: String,
    pub status: Option<CountryStatus>,
    pub source_url: String,
    pub raw_excerpt: Option<String>,
    pub error: Option<String>,
    pub checked_at: String,
}

/// Fila de notifications (append-only, solo cuando se despachó algo).
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub country: String,
    pub status: CountryStatus,
    pub recipient: String,
    pub provider: String,
    pub provider_message_id: Option<String>,
    pub sent_at: String,
}
