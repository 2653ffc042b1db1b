use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::{ReservationId, ReservationStatus, TablePreference},
    error::DraftError,
};

pub const DEFAULT_PARTY_SIZE: u32 = 2;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const TIME_FORMAT_WITH_SECONDS: &str = "%H:%M:%S";

/// Parses a `YYYY-MM-DD` date. Timestamps such as `2099-01-01T00:00:00Z` are
/// truncated to their date part.
pub fn parse_reservation_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, DATE_FORMAT)
}

/// Parses an `HH:MM` or `HH:MM:SS` time of day.
pub fn parse_reservation_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT_WITH_SECONDS)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, TIME_FORMAT))
}

/// Server-confirmed reservation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_phone: Option<String>,
    #[serde(with = "wire_date")]
    pub reservation_date: NaiveDate,
    #[serde(with = "wire_time")]
    pub reservation_time: NaiveTime,
    pub party_size: u32,
    #[serde(
        rename = "table_number",
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub table_preference: Option<TablePreference>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.reservation_date.and_time(self.reservation_time)
    }
}

/// Unsubmitted reservation input, as collected by a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationDraft {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(with = "optional_wire_date", skip_serializing_if = "Option::is_none")]
    pub reservation_date: Option<NaiveDate>,
    #[serde(with = "optional_wire_time", skip_serializing_if = "Option::is_none")]
    pub reservation_time: Option<NaiveTime>,
    pub party_size: u32,
    #[serde(
        rename = "table_number",
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub table_preference: Option<TablePreference>,
    #[serde(deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl Default for ReservationDraft {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            customer_email: String::new(),
            customer_phone: None,
            reservation_date: None,
            reservation_time: None,
            party_size: DEFAULT_PARTY_SIZE,
            table_preference: None,
            special_requests: None,
        }
    }
}

impl ReservationDraft {
    /// Field-presence checks, in order; the first failure wins.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.customer_name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.customer_email.trim().is_empty() {
            return Err(DraftError::MissingEmail);
        }
        if self.reservation_date.is_none() {
            return Err(DraftError::MissingDate);
        }
        if self.reservation_time.is_none() {
            return Err(DraftError::MissingTime);
        }
        Ok(())
    }

    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        Some(self.reservation_date?.and_time(self.reservation_time?))
    }
}

/// Partial update; only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReservationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(with = "optional_wire_date", skip_serializing_if = "Option::is_none")]
    pub reservation_date: Option<NaiveDate>,
    #[serde(with = "optional_wire_time", skip_serializing_if = "Option::is_none")]
    pub reservation_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    #[serde(rename = "table_number", skip_serializing_if = "Option::is_none")]
    pub table_preference: Option<TablePreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
}

impl ReservationUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Success body: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Failure body: `{ "error": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceErrorBody {
    pub fn reason(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    // Services hand out table numbers as integers as often as text.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Integer(i64),
    }

    let raw = Option::<RawText>::deserialize(deserializer)?.map(|raw| match raw {
        RawText::Text(value) => value,
        RawText::Integer(value) => value.to_string(),
    });
    Ok(raw.filter(|value| !value.trim().is_empty()).map(T::from))
}

mod wire_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(super::DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_reservation_date(&raw).map_err(de::Error::custom)
    }
}

mod wire_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_reservation_time(&raw).map_err(de::Error::custom)
    }
}

mod optional_wire_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => super::wire_date::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_reservation_date(&raw)
                .map(Some)
                .map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}

mod optional_wire_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => super::wire_time::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_reservation_time(&raw)
                .map(Some)
                .map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}
