use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    visit_recorded: bool,
}

impl Session {
    pub fn start() -> Self {
        let started_at = Utc::now();
        let token: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        Self {
            id: format!("session_{}_{}", started_at.timestamp_millis(), token),
            started_at,
            visit_recorded: false,
        }
    }

    // The visit was recorded by an earlier invocation.
    pub fn resume(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            started_at: Utc::now(),
            visit_recorded: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn visit_recorded(&self) -> bool {
        self.visit_recorded
    }

    pub(crate) fn mark_visit_recorded(&mut self) {
        self.visit_recorded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_carry_timestamp_and_token() {
        let session = Session::start();
        let parts: Vec<&str> = session.id().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert_eq!(parts[1], session.started_at().timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(!session.visit_recorded());
    }

    #[test]
    fn sessions_are_unique() {
        assert_ne!(Session::start().id(), Session::start().id());
    }

    #[test]
    fn resumed_sessions_skip_visit_tracking() {
        let session = Session::resume("session_1_abcdefghi");
        assert_eq!(session.id(), "session_1_abcdefghi");
        assert!(session.visit_recorded());
    }
}
