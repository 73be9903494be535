//! Validation policy

use chrono::{DateTime, Utc};

/// How data objects that were not supplied affect the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Report orphan references but do not fail because of them
    Tolerate,
    /// Fail unless every protected data object was supplied
    RequireAllDataObjects,
}

/// Policy for validating evidence records
///
/// There is no `Default`; the orphan policy is always chosen by the caller.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    /// Effect of orphan references on the verdict
    pub orphan_policy: OrphanPolicy,
    /// Time at which the most recent timestamp token is judged
    pub validation_time: DateTime<Utc>,
}

impl ValidationPolicy {
    /// Create a policy validating at the current time
    pub fn new(orphan_policy: OrphanPolicy) -> Self {
        Self {
            orphan_policy,
            validation_time: Utc::now(),
        }
    }

    /// Validate as of `time` instead of now
    pub fn at_time(mut self, time: DateTime<Utc>) -> Self {
        self.validation_time = time;
        self
    }

    /// Whether orphan references fail the record
    pub fn requires_all_data_objects(&self) -> bool {
        self.orphan_policy == OrphanPolicy::RequireAllDataObjects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_time_override() {
        let time = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        let policy = ValidationPolicy::new(OrphanPolicy::Tolerate).at_time(time);
        assert_eq!(policy.validation_time, time);
        assert!(!policy.requires_all_data_objects());
        assert!(ValidationPolicy::new(OrphanPolicy::RequireAllDataObjects)
            .requires_all_data_objects());
    }
}
