use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned reservation identifier.
///
/// Services hand these out either as strings or as integer keys; both are
/// kept as text so the client never has to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ReservationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ReservationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for ReservationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self(value),
            RawId::Number(value) => Self(value.to_string()),
        })
    }
}

/// Lifecycle state of a reservation. Travels in snake_case; values this
/// client does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Other(String),
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Cancelled,
        ReservationStatus::Completed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Other(value) => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Confirmed => "Confirmed",
            ReservationStatus::Cancelled => "Cancelled",
            ReservationStatus::Completed => "Completed",
            ReservationStatus::Other(value) => value,
        }
    }

    /// Only the known states; used for user input.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl From<String> for ReservationStatus {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(ReservationStatus::Other(value))
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for ReservationStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReservationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Seating preference. Travels as free text in the `table_number` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TablePreference {
    Terrace,
    Window,
    Private,
    /// A specific table number or any other request, kept verbatim.
    Other(String),
}

impl TablePreference {
    pub const CATEGORIES: [TablePreference; 3] = [
        TablePreference::Terrace,
        TablePreference::Window,
        TablePreference::Private,
    ];

    /// Returns `None` for blank input, which means "no preference".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self::from(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            TablePreference::Terrace => "Terraza",
            TablePreference::Window => "Ventana",
            TablePreference::Private => "Privada",
            TablePreference::Other(value) => value,
        }
    }
}

impl From<String> for TablePreference {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "terraza" | "terrace" => TablePreference::Terrace,
            "ventana" | "window" => TablePreference::Window,
            "privada" | "private" => TablePreference::Private,
            _ => TablePreference::Other(value),
        }
    }
}

impl fmt::Display for TablePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for TablePreference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TablePreference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}
