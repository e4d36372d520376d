// libs/scheduling-cell/src/services/token.rs
use chrono::NaiveDate;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::SchedulingError;

pub struct TokenService {
    supabase: SupabaseClient,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Draw the next ticket number for (hospital, date).
    ///
    /// The `next_daily_token` function upserts and increments the counter
    /// row in a single statement, so two concurrent callers can never
    /// receive the same count. Counts are never rolled back: a booking that
    /// fails after this point leaves a gap, which is accepted; tokens are
    /// unique and increasing, not contiguous.
    pub async fn next_token(
        &self,
        hospital_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<i64, SchedulingError> {
        let count: i64 = self
            .supabase
            .rpc(
                "next_daily_token",
                Some(auth_token),
                json!({
                    "p_hospital_id": hospital_id,
                    "p_date": date.to_string(),
                }),
            )
            .await?;

        debug!(
            "Issued daily token {} for hospital {} on {}",
            count, hospital_id, date
        );
        Ok(count)
    }
}

/// Format a waiting-room ticket: `{initials}00{count}-{date}`, e.g. the
/// third booking at "Happy Paws Clinic" on 2025-09-01 becomes
/// `HPC003-2025-09-01`. Hospitals with an empty or unparseable display
/// name fall back to the `XX` prefix.
pub fn format_token(hospital_name: &str, count: i64, date: &str) -> String {
    let initials: String = hospital_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    let prefix = if initials.is_empty() {
        "XX".to_string()
    } else {
        initials
    };

    format!("{}00{}-{}", prefix, count, date)
}
