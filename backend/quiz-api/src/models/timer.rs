use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Countdown events published by the attempt clock and relayed to the
/// quiz-taking UI over SSE.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TimerEvent {
    TimerTick(TimerTick),
    TimeExpired(TimeExpired),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimerTick {
    pub attempt_id: String,
    pub remaining_seconds: u32,
    pub elapsed_seconds: u32,
    pub total_seconds: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeExpired {
    pub attempt_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl TimerEvent {
    pub fn tick(attempt_id: &str, remaining_seconds: u32, total_seconds: u32) -> Self {
        TimerEvent::TimerTick(TimerTick {
            attempt_id: attempt_id.to_string(),
            remaining_seconds,
            elapsed_seconds: total_seconds.saturating_sub(remaining_seconds),
            total_seconds,
            timestamp: Utc::now(),
        })
    }

    pub fn expired(attempt_id: &str) -> Self {
        TimerEvent::TimeExpired(TimeExpired {
            attempt_id: attempt_id.to_string(),
            timestamp: Utc::now(),
            message: "Time limit exceeded".to_string(),
        })
    }

    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            TimerEvent::TimerTick(_) => "timer-tick",
            TimerEvent::TimeExpired(_) => "time-expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_event_carries_elapsed_and_kebab_case_tag() {
        let event = TimerEvent::tick("attempt-1", 45, 60);
        assert_eq!(event.event_name(), "timer-tick");

        let json: serde_json::Value = serde_json::from_str(&event.to_sse_data()).unwrap();
        assert_eq!(json["type"], "timer-tick");
        assert_eq!(json["remaining_seconds"], 45);
        assert_eq!(json["elapsed_seconds"], 15);
        assert_eq!(json["total_seconds"], 60);
    }

    #[test]
    fn expired_event_name() {
        assert_eq!(TimerEvent::expired("attempt-1").event_name(), "time-expired");
    }
}
