// libs/scheduling-cell/src/services/availability.rs
use std::collections::HashSet;

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    AvailabilityLookup, AvailabilityQuery, BlackoutEntry, SchedulingError, SlotDefinition,
    SlotView,
};

/// Row shape for the ledger query; only the consumed slot id is needed.
#[derive(Debug, Deserialize)]
struct BookedSlotRow {
    slot_id: Uuid,
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Combine the weekly template, blackout exceptions and the booking
    /// ledger into the client-facing slot list for one provider/date.
    ///
    /// Read-only: safe to call concurrently and repeatedly. Template order
    /// is preserved; the output is never re-sorted.
    pub async fn get_availability(
        &self,
        query: AvailabilityQuery,
        auth_token: &str,
    ) -> Result<Vec<SlotView>, SchedulingError> {
        let lookup = query.validate()?;
        debug!(
            "Computing availability for provider {} on {} ({})",
            lookup.provider_id, lookup.date, lookup.weekday
        );

        let template = self.get_slot_template(&lookup, auth_token).await?;

        // No slots configured for this weekday is a valid empty outcome.
        if template.is_empty() {
            return Ok(vec![]);
        }

        let blocked = self.get_blocked_times(&lookup, auth_token).await?;
        let booked = self.get_booked_slot_ids(&lookup, auth_token).await?;

        let views = template
            .into_iter()
            .filter(|slot| !blocked.contains(&slot.display_time))
            .map(|slot| {
                let is_booked = booked.contains(&slot.id);
                SlotView {
                    slot_id: slot.id,
                    display_time: slot.display_time,
                    is_booked,
                    // Booked status always wins over the template default.
                    is_default_selected: slot.is_default_selected && !is_booked,
                }
            })
            .collect();

        Ok(views)
    }

    async fn get_slot_template(
        &self,
        lookup: &AvailabilityLookup,
        auth_token: &str,
    ) -> Result<Vec<SlotDefinition>, SchedulingError> {
        let path = format!(
            "/rest/v1/slot_templates?provider_id=eq.{}&weekday=eq.{}&order=position.asc",
            lookup.provider_id, lookup.weekday
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let template: Vec<SlotDefinition> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(|e| {
                SchedulingError::Database(format!("Failed to parse slot template: {}", e))
            })?;

        Ok(template)
    }

    async fn get_blocked_times(
        &self,
        lookup: &AvailabilityLookup,
        auth_token: &str,
    ) -> Result<HashSet<String>, SchedulingError> {
        let path = format!(
            "/rest/v1/blackouts?provider_id=eq.{}&date=eq.{}",
            lookup.provider_id, lookup.date
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        // No blackout row for this date means nothing is blocked.
        let Some(entry) = result.into_iter().next() else {
            return Ok(HashSet::new());
        };

        let blackout: BlackoutEntry = serde_json::from_value(entry).map_err(|e| {
            SchedulingError::Database(format!("Failed to parse blackout entry: {}", e))
        })?;

        Ok(blackout.blocked_display_times.into_iter().collect())
    }

    async fn get_booked_slot_ids(
        &self,
        lookup: &AvailabilityLookup,
        auth_token: &str,
    ) -> Result<HashSet<Uuid>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&date=eq.{}&select=slot_id",
            lookup.provider_id, lookup.date
        );

        let rows: Vec<BookedSlotRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(rows.into_iter().map(|row| row.slot_id).collect())
    }
}
