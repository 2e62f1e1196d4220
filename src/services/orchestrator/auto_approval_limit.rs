//! Auto-Approval Request Ceiling
//!
//! Counts requests approved without the human. Once the count passes
//! `allowedMaxRequests` the next auto-approval is turned into an
//! `auto_approval_max_req_reached` ask; a "yes" resets the count.

use serde::Serialize;

use crate::models::settings::AutoApprovalSettings;

/// Result of recording one auto-approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitCheck {
    Within,
    /// The ceiling was passed; the human must confirm before continuing
    Reached { limit: u32 },
}

/// Payload of an `auto_approval_max_req_reached` ask.
#[derive(Debug, Clone, Serialize)]
pub struct LimitReachedPayload {
    pub count: u32,
    #[serde(rename = "type")]
    pub limit_type: &'static str,
}

impl LimitReachedPayload {
    pub fn requests(count: u32) -> Self {
        Self {
            count,
            limit_type: "requests",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Per-session counter of consecutive auto-approved requests.
#[derive(Debug, Clone, Default)]
pub struct AutoApprovalLimiter {
    consecutive_auto_approved: u32,
}

impl AutoApprovalLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.consecutive_auto_approved
    }

    /// Count one auto-approval against the configured ceiling.
    pub fn record_auto_approval(&mut self, settings: &AutoApprovalSettings) -> LimitCheck {
        self.consecutive_auto_approved += 1;
        match settings.allowed_max_requests {
            Some(limit) if self.consecutive_auto_approved > limit => {
                tracing::info!(
                    "[auto-approval] {} consecutive auto-approvals exceed the limit of {}",
                    self.consecutive_auto_approved,
                    limit
                );
                LimitCheck::Reached { limit }
            }
            _ => LimitCheck::Within,
        }
    }

    /// The human took part (answered an ask or confirmed the ceiling).
    pub fn reset(&mut self) {
        self.consecutive_auto_approved = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_limit_never_reached() {
        let settings = AutoApprovalSettings::default();
        let mut limiter = AutoApprovalLimiter::new();
        for _ in 0..100 {
            assert_eq!(limiter.record_auto_approval(&settings), LimitCheck::Within);
        }
    }

    #[test]
    fn test_limit_reached_after_max() {
        let settings = AutoApprovalSettings {
            allowed_max_requests: Some(2),
            ..Default::default()
        };
        let mut limiter = AutoApprovalLimiter::new();
        assert_eq!(limiter.record_auto_approval(&settings), LimitCheck::Within);
        assert_eq!(limiter.record_auto_approval(&settings), LimitCheck::Within);
        assert_eq!(
            limiter.record_auto_approval(&settings),
            LimitCheck::Reached { limit: 2 }
        );

        limiter.reset();
        assert_eq!(limiter.count(), 0);
        assert_eq!(limiter.record_auto_approval(&settings), LimitCheck::Within);
    }

    #[test]
    fn test_payload_wire_format() {
        let json = LimitReachedPayload::requests(5).to_json();
        assert_eq!(json, r#"{"count":5,"type":"requests"}"#);
    }
}
