use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the config at a wiremock server.
    pub fn for_server(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST row shapes used across cell tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn slot_template(
        id: &str,
        provider_id: &str,
        weekday: &str,
        display_time: &str,
        machine_time: &str,
        position: i32,
        is_default_selected: bool,
    ) -> Value {
        json!({
            "id": id,
            "provider_id": provider_id,
            "weekday": weekday,
            "display_time": display_time,
            "machine_time": machine_time,
            "is_default_selected": is_default_selected,
            "position": position
        })
    }

    pub fn blackout(provider_id: &str, date: &str, weekday: &str, blocked: &[&str]) -> Value {
        json!({
            "provider_id": provider_id,
            "date": date,
            "weekday": weekday,
            "blocked_display_times": blocked
        })
    }

    pub fn appointment(
        id: &str,
        hospital_id: &str,
        provider_id: &str,
        date: &str,
        slot_id: &str,
        token_number: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "hospital_id": hospital_id,
            "provider_id": provider_id,
            "date": date,
            "slot_id": slot_id,
            "token_number": token_number,
            "companion_id": Uuid::new_v4().to_string(),
            "owner_id": Uuid::new_v4().to_string(),
            "purpose": "Annual checkup",
            "appointment_type": "consultation",
            "source": "web",
            "status": status,
            "created_at": "2025-09-01T08:00:00Z",
            "updated_at": "2025-09-01T08:00:00Z"
        })
    }

    pub fn provider(id: &str, hospital_id: Option<&str>) -> Value {
        json!({
            "id": id,
            "hospital_id": hospital_id
        })
    }

    pub fn hospital(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name
        })
    }
}
