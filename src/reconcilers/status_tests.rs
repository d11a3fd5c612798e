// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        Condition, HealthCheck, HealthCheckEndpoint, HealthCheckFeatures, HealthCheckProtocol,
        HealthCheckSpec, HealthCheckStatus,
    };
    use crate::reconcilers::status::{
        conditions_equal, create_condition, find_condition, update_condition_in_memory,
        HealthCheckStatusUpdater,
    };
    use crate::status_reasons::{CONDITION_TYPE_READY, REASON_PROVIDER_ERROR, REASON_SYNCED};

    const STATUS_TRUE: &str = "True";
    const STATUS_FALSE: &str = "False";

    fn health_check(status: Option<HealthCheckStatus>) -> HealthCheck {
        let mut hc = HealthCheck::new(
            "web",
            HealthCheckSpec {
                enabled: true,
                invert: false,
                protocol: HealthCheckProtocol::Tcp,
                port: 443,
                path: None,
                endpoint: HealthCheckEndpoint {
                    address: Some("192.0.2.10".to_string()),
                    hostname: None,
                },
                failure_threshold: 3,
                features: HealthCheckFeatures::default(),
            },
        );
        hc.metadata.namespace = Some("default".to_string());
        hc.status = status;
        hc
    }

    #[test]
    fn test_create_condition_basic() {
        let condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, REASON_SYNCED, "ok");

        assert_eq!(condition.r#type, CONDITION_TYPE_READY);
        assert_eq!(condition.status, STATUS_TRUE);
        assert_eq!(condition.reason.as_deref(), Some(REASON_SYNCED));
        assert_eq!(condition.message.as_deref(), Some("ok"));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![
            create_condition("Progressing", STATUS_TRUE, "Rolling", "Rolling out"),
            create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "Pending", "Waiting"),
        ];

        let ready = find_condition(&conditions, CONDITION_TYPE_READY).unwrap();
        assert_eq!(ready.status, STATUS_FALSE);
        assert!(find_condition(&conditions, "Degraded").is_none());
    }

    #[test]
    fn test_update_condition_keeps_transition_time_for_same_status() {
        let mut conditions = vec![Condition {
            r#type: CONDITION_TYPE_READY.to_string(),
            status: STATUS_TRUE.to_string(),
            reason: Some(REASON_SYNCED.to_string()),
            message: Some("old".to_string()),
            last_transition_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        }];

        update_condition_in_memory(
            &mut conditions,
            CONDITION_TYPE_READY,
            STATUS_TRUE,
            REASON_SYNCED,
            "new",
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].message.as_deref(), Some("new"));
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_update_condition_resets_transition_time_on_status_change() {
        let mut conditions = vec![Condition {
            r#type: CONDITION_TYPE_READY.to_string(),
            status: STATUS_TRUE.to_string(),
            reason: Some(REASON_SYNCED.to_string()),
            message: None,
            last_transition_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        }];

        update_condition_in_memory(
            &mut conditions,
            CONDITION_TYPE_READY,
            STATUS_FALSE,
            REASON_PROVIDER_ERROR,
            "throttled",
        );

        assert_eq!(conditions[0].status, STATUS_FALSE);
        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_conditions_equal_ignores_transition_time() {
        let mut a = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, REASON_SYNCED, "ok");
        let b = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, REASON_SYNCED, "ok");
        a.last_transition_time = Some("2025-01-01T00:00:00+00:00".to_string());

        assert!(conditions_equal(&[a.clone()], &[b.clone()]));
        assert!(!conditions_equal(&[a], &[]));

        let other = create_condition(CONDITION_TYPE_READY, STATUS_FALSE, REASON_SYNCED, "ok");
        assert!(!conditions_equal(&[b], &[other]));
    }

    #[test]
    fn test_updater_without_status_has_changes() {
        let updater = HealthCheckStatusUpdater::new(&health_check(None));
        assert!(updater.has_changes());
    }

    #[test]
    fn test_updater_detects_no_change() {
        let status = HealthCheckStatus {
            id: Some("hc-1".to_string()),
            observed_generation: Some(2),
            conditions: vec![create_condition(
                CONDITION_TYPE_READY,
                STATUS_TRUE,
                REASON_SYNCED,
                "in sync",
            )],
            ..HealthCheckStatus::default()
        };
        let mut updater = HealthCheckStatusUpdater::new(&health_check(Some(status)));

        updater.set_id(Some("hc-1".to_string()));
        updater.set_observed_generation(Some(2));
        updater.set_ready(REASON_SYNCED, "in sync");

        assert!(!updater.has_changes());
    }

    #[test]
    fn test_updater_records_id_and_failure() {
        let mut updater = HealthCheckStatusUpdater::new(&health_check(None));

        updater.set_id(Some("hc-1".to_string()));
        updater.set_not_ready(REASON_PROVIDER_ERROR, "throttled");

        let status = updater.status();
        assert_eq!(status.id.as_deref(), Some("hc-1"));
        let ready = find_condition(&status.conditions, CONDITION_TYPE_READY).unwrap();
        assert_eq!(ready.status, STATUS_FALSE);
        assert_eq!(ready.reason.as_deref(), Some(REASON_PROVIDER_ERROR));
    }
}
