use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const ANONYMOUS_USER: &str = "anonymous";

/// Per-request metadata passed explicitly through the pipeline and to the
/// history recorder.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub user_id: String,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(user_id: Option<String>) -> Self {
        let user_id = user_id
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        Self {
            request_id: Uuid::new_v4(),
            user_id,
            received_at: Utc::now(),
        }
    }
}
