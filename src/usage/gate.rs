//! Daily quota decision

/// Shared daily budget for all actions (merge and protect draw from it alike)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGate {
    limit: u32,
}

/// Returned when today's budget is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Daily usage limit reached ({limit} actions/day). Upgrade to continue.")]
pub struct QuotaExceeded {
    pub limit: u32,
}

impl QuotaGate {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// An action is permitted while the count is strictly below the limit
    pub fn is_allowed(&self, current_count: u32) -> bool {
        current_count < self.limit
    }

    /// Actions left today; never negative, even if the count overshot
    pub fn remaining(&self, current_count: u32) -> u32 {
        self.limit.saturating_sub(current_count)
    }

    pub fn check(&self, current_count: u32) -> Result<(), QuotaExceeded> {
        if self.is_allowed(current_count) {
            Ok(())
        } else {
            Err(QuotaExceeded { limit: self.limit })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_strictly_below_limit() {
        let gate = QuotaGate::new(5);

        for count in 0..5 {
            assert!(gate.is_allowed(count), "count {} should be allowed", count);
        }
        assert!(!gate.is_allowed(5));
        assert!(!gate.is_allowed(6));
        assert!(!gate.is_allowed(u32::MAX));
    }

    #[test]
    fn test_zero_limit_denies_everything() {
        let gate = QuotaGate::new(0);
        assert!(!gate.is_allowed(0));
        assert_eq!(gate.remaining(0), 0);
    }

    #[test]
    fn test_remaining_saturates() {
        let gate = QuotaGate::new(5);
        assert_eq!(gate.remaining(0), 5);
        assert_eq!(gate.remaining(3), 2);
        assert_eq!(gate.remaining(5), 0);
        assert_eq!(gate.remaining(9), 0);
    }

    #[test]
    fn test_check_message() {
        let gate = QuotaGate::new(5);
        assert!(gate.check(4).is_ok());

        let denied = gate.check(5).unwrap_err();
        assert_eq!(denied.limit, 5);
        assert_eq!(
            denied.to_string(),
            "Daily usage limit reached (5 actions/day). Upgrade to continue."
        );
    }
}
