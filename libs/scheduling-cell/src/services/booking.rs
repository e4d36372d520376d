// libs/scheduling-cell/src/services/booking.rs
use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

use crate::models::{
    parse_reference_id, Appointment, AppointmentStatus, BookAppointmentRequest,
    BookingConfirmation, BookingIntent, SchedulingError, SlotDefinition,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::token::{format_token, TokenService};

#[derive(Debug, Deserialize)]
struct ProviderAffiliationRow {
    hospital_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct HospitalRow {
    name: String,
}

pub struct BookingService {
    supabase: SupabaseClient,
    token_service: TokenService,
    lifecycle_service: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            token_service: TokenService::new(config),
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Book one concrete slot on one concrete date.
    ///
    /// Duplicate prevention is delegated to the store: the appointments
    /// table carries a unique index on (provider_id, date, slot_id), and a
    /// conflict on insert is reported back with the occupying record
    /// attached. There is no separate pre-check, so no race window between
    /// checking and inserting.
    ///
    /// The token counter increments before the insert and is never rolled
    /// back; a failed insert leaves a gap in that day's sequence, which is
    /// harmless.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<BookingConfirmation, SchedulingError> {
        let intent = request.validate()?;
        info!(
            "Booking slot {} for provider {} on {}",
            intent.slot_id, intent.provider_id, intent.date
        );

        let hospital_id = self
            .resolve_hospital_for_provider(intent.provider_id, auth_token)
            .await?;
        let hospital_name = self.resolve_hospital_name(hospital_id, auth_token).await?;

        // The slot must still exist in the provider's template.
        let slot = self
            .resolve_slot(intent.provider_id, intent.slot_id, auth_token)
            .await?;

        let count = self
            .token_service
            .next_token(hospital_id, intent.date, auth_token)
            .await?;
        let token_number = format_token(&hospital_name, count, &intent.date_raw);

        let appointment = self
            .insert_appointment(&intent, hospital_id, &token_number, auth_token)
            .await?;

        info!(
            "Appointment {} booked: slot {} ({}) with token {}",
            appointment.id, slot.id, slot.display_time, token_number
        );

        Ok(BookingConfirmation {
            appointment,
            token_number,
        })
    }

    /// Fetch one ledger entry by id.
    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let id = parse_reference_id(appointment_id, "appointment_id")?;
        debug!("Fetching appointment: {}", id);

        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let Some(row) = result.into_iter().next() else {
            return Err(SchedulingError::NotFound("appointment"));
        };

        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Database(format!("Failed to parse appointment: {}", e)))
    }

    /// Move an appointment through its lifecycle. The raw status string is
    /// validated against the enumeration first, then against the transition
    /// table for the record's current status; nothing is written unless
    /// both checks pass.
    ///
    /// The write is conditional on the status the transition was validated
    /// against: the PATCH filters on both id and status, so a concurrent
    /// writer that moves the record first makes this PATCH match zero rows
    /// instead of applying a stale transition.
    pub async fn set_status(
        &self,
        appointment_id: &str,
        raw_status: &str,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let new_status: AppointmentStatus = raw_status.parse()?;
        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(current.status, new_status)?;

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            current.id, current.status
        );
        let update_data = json!({
            "status": new_status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(headers),
            )
            .await?;

        let Some(row) = result.into_iter().next() else {
            // Zero rows matched: another writer moved the record between the
            // read and the conditional PATCH. Report the transition against
            // the status that actually holds now.
            let latest = self.get_appointment(appointment_id, auth_token).await?;
            warn!(
                "Appointment {} moved from {} to {} during status update",
                latest.id, current.status, latest.status
            );
            return Err(SchedulingError::InvalidStatusTransition {
                from: latest.status,
                to: new_status,
            });
        };

        let updated: Appointment = serde_json::from_value(row).map_err(|e| {
            SchedulingError::Database(format!("Failed to parse updated appointment: {}", e))
        })?;

        info!(
            "Appointment {} moved from {} to {}",
            updated.id, current.status, updated.status
        );
        Ok(updated)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn resolve_hospital_for_provider(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Uuid, SchedulingError> {
        let path = format!(
            "/rest/v1/providers?id=eq.{}&select=hospital_id",
            provider_id
        );
        let rows: Vec<ProviderAffiliationRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .next()
            .and_then(|row| row.hospital_id)
            .ok_or(SchedulingError::NotFound("business"))
    }

    async fn resolve_hospital_name(
        &self,
        hospital_id: Uuid,
        auth_token: &str,
    ) -> Result<String, SchedulingError> {
        let path = format!("/rest/v1/hospitals?id=eq.{}&select=name", hospital_id);
        let rows: Vec<HospitalRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .next()
            .map(|row| row.name)
            .ok_or(SchedulingError::NotFound("hospital"))
    }

    async fn resolve_slot(
        &self,
        provider_id: Uuid,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<SlotDefinition, SchedulingError> {
        let path = format!(
            "/rest/v1/slot_templates?id=eq.{}&provider_id=eq.{}",
            slot_id, provider_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let Some(row) = result.into_iter().next() else {
            return Err(SchedulingError::NotFound("slot"));
        };

        serde_json::from_value(row).map_err(|e| {
            SchedulingError::Database(format!("Failed to parse slot definition: {}", e))
        })
    }

    async fn insert_appointment(
        &self,
        intent: &BookingIntent,
        hospital_id: Uuid,
        token_number: &str,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let now = Utc::now();
        let appointment_data = json!({
            "hospital_id": hospital_id,
            "provider_id": intent.provider_id,
            "date": intent.date_raw,
            "slot_id": intent.slot_id,
            "token_number": token_number,
            "companion_id": intent.companion_id,
            "owner_id": intent.owner_id,
            "purpose": intent.purpose,
            "appointment_type": intent.appointment_type,
            "source": intent.source,
            "status": AppointmentStatus::Booked.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Result<Vec<Value>, SupabaseError> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            // Unique violation on (provider_id, date, slot_id): someone got
            // the slot first. Surface their record for client display.
            Err(SupabaseError::Conflict(_)) => {
                warn!(
                    "Slot {} on {} already taken for provider {}",
                    intent.slot_id, intent.date, intent.provider_id
                );
                let existing = self.fetch_conflicting_appointment(intent, auth_token).await?;
                return Err(SchedulingError::SlotTaken {
                    existing: Box::new(existing),
                });
            }
            Err(other) => return Err(other.into()),
        };

        let Some(row) = rows.into_iter().next() else {
            return Err(SchedulingError::Database(
                "Failed to create appointment".to_string(),
            ));
        };

        serde_json::from_value(row).map_err(|e| {
            SchedulingError::Database(format!("Failed to parse created appointment: {}", e))
        })
    }

    async fn fetch_conflicting_appointment(
        &self,
        intent: &BookingIntent,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&date=eq.{}&slot_id=eq.{}",
            intent.provider_id, intent.date_raw, intent.slot_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let Some(row) = result.into_iter().next() else {
            return Err(SchedulingError::Database(
                "Conflicting appointment could not be loaded".to_string(),
            ));
        };

        serde_json::from_value(row).map_err(|e| {
            SchedulingError::Database(format!("Failed to parse conflicting appointment: {}", e))
        })
    }
}
