// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use shared_database::SupabaseError;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// One entry in a provider's recurring weekly template. Owned by provider
/// configuration; this subsystem only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub weekday: Weekday,
    pub display_time: String,
    pub machine_time: String,
    pub is_default_selected: bool,
    pub position: i32,
}

/// Client-facing view of one slot on one concrete date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub slot_id: Uuid,
    pub display_time: String,
    pub is_booked: bool,
    pub is_default_selected: bool,
}

/// Ad-hoc exception removing slots from one provider's schedule on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackoutEntry {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub blocked_display_times: Vec<String>,
}

/// A confirmed booking in the ledger. At most one row may exist per
/// (provider_id, date, slot_id); the store enforces this with a unique
/// index. Rows are never physically deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slot_id: Uuid,
    pub token_number: String,
    pub companion_id: Uuid,
    pub owner_id: Uuid,
    pub purpose: Option<String>,
    pub appointment_type: String,
    pub source: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Accepted,
    #[serde(alias = "checkedIn")]
    CheckedIn,
    #[serde(alias = "inProgress")]
    InProgress,
    Fulfilled,
    Cancelled,
    #[serde(alias = "noshow")]
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Fulfilled | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Accepted => write!(f, "accepted"),
            AppointmentStatus::CheckedIn => write!(f, "checked_in"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Fulfilled => write!(f, "fulfilled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(AppointmentStatus::Booked),
            "accepted" => Ok(AppointmentStatus::Accepted),
            "checked_in" | "checkedIn" => Ok(AppointmentStatus::CheckedIn),
            "in_progress" | "inProgress" => Ok(AppointmentStatus::InProgress),
            "fulfilled" => Ok(AppointmentStatus::Fulfilled),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" | "noshow" => Ok(AppointmentStatus::NoShow),
            other => Err(SchedulingError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(Weekday::Monday),
            "tuesday" => Ok(Weekday::Tuesday),
            "wednesday" => Ok(Weekday::Wednesday),
            "thursday" => Ok(Weekday::Thursday),
            "friday" => Ok(Weekday::Friday),
            "saturday" => Ok(Weekday::Saturday),
            "sunday" => Ok(Weekday::Sunday),
            _ => Err(SchedulingError::InvalidWeekday(s.to_string())),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Raw booking request as it arrives at the boundary. Every field is
/// validated into a `BookingIntent` before any domain logic runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub provider_id: String,
    pub date: String,
    pub slot_id: String,
    pub companion_id: String,
    pub owner_id: String,
    pub purpose: Option<String>,
    pub appointment_type: Option<String>,
    pub source: Option<String>,
}

/// A booking request after boundary validation: identifiers parsed, the
/// date confirmed to be a real calendar day.
#[derive(Debug, Clone)]
pub struct BookingIntent {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub date_raw: String,
    pub slot_id: Uuid,
    pub companion_id: Uuid,
    pub owner_id: Uuid,
    pub purpose: Option<String>,
    pub appointment_type: String,
    pub source: String,
}

impl BookAppointmentRequest {
    pub fn validate(&self) -> Result<BookingIntent, SchedulingError> {
        let date = parse_iso_date(&self.date)?;
        let provider_id = parse_reference_id(&self.provider_id, "provider_id")?;
        let slot_id = parse_reference_id(&self.slot_id, "slot_id")?;
        let companion_id = parse_reference_id(&self.companion_id, "companion_id")?;
        let owner_id = parse_reference_id(&self.owner_id, "owner_id")?;

        Ok(BookingIntent {
            provider_id,
            date,
            date_raw: self.date.clone(),
            slot_id,
            companion_id,
            owner_id,
            purpose: self.purpose.clone(),
            appointment_type: self
                .appointment_type
                .clone()
                .unwrap_or_else(|| "consultation".to_string()),
            source: self.source.clone().unwrap_or_else(|| "web".to_string()),
        })
    }
}

/// Raw availability lookup parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub provider_id: String,
    pub weekday: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct AvailabilityLookup {
    pub provider_id: Uuid,
    pub weekday: Weekday,
    pub date: NaiveDate,
}

impl AvailabilityQuery {
    pub fn validate(&self) -> Result<AvailabilityLookup, SchedulingError> {
        Ok(AvailabilityLookup {
            provider_id: parse_reference_id(&self.provider_id, "provider_id")?,
            weekday: self.weekday.parse()?,
            date: parse_iso_date(&self.date)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub token_number: String,
}

// ==============================================================================
// BOUNDARY VALIDATION
// ==============================================================================

/// Provider, hospital, companion and owner identifiers all share the
/// 36-character hyphenated UUID shape; anything else is rejected before a
/// single store round trip happens.
pub fn parse_reference_id(value: &str, field: &'static str) -> Result<Uuid, SchedulingError> {
    if value.len() != 36 {
        return Err(SchedulingError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    Uuid::parse_str(value).map_err(|_| SchedulingError::InvalidIdentifier {
        field,
        value: value.to_string(),
    })
}

/// Dates must match the fixed `YYYY-MM-DD` pattern AND name a real calendar
/// day. chrono alone is too lenient about zero-padding, so the shape is
/// checked first.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, SchedulingError> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());

    if !shape_ok {
        return Err(SchedulingError::InvalidDate(value.to_string()));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| SchedulingError::InvalidDate(value.to_string()))
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid weekday `{0}`")]
    InvalidWeekday(String),

    #[error("Invalid {field} `{value}`")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("Unknown appointment status `{0}`")]
    UnknownStatus(String),

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Slot is already booked")]
    SlotTaken { existing: Box<Appointment> },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),
}

impl From<SupabaseError> for SchedulingError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Transport(e) => SchedulingError::Upstream(e.to_string()),
            SupabaseError::Auth(msg) => {
                SchedulingError::Upstream(format!("store rejected credentials: {}", msg))
            }
            // Conflicts are interpreted at the insert call site; one reaching
            // this conversion came from a query that should never conflict.
            other => SchedulingError::Database(other.to_string()),
        }
    }
}
