//! Property-based tests for settings validation.
//!
//! Every value inside a documented range must be accepted and every value
//! outside it rejected with an error naming the offending variable.

use proptest::prelude::*;
use std::collections::HashMap;
use tale_core::{AiServiceConfig, ApplicationConfig, ConfigError, StoryRequest};

fn ai_vars(extra: &[(&'static str, String)]) -> HashMap<&'static str, String> {
    let mut vars = HashMap::from([("AI_API_KEY", "secret".to_string())]);
    vars.extend(extra.iter().cloned());
    vars
}

fn build_ai(vars: &HashMap<&'static str, String>) -> Result<AiServiceConfig, ConfigError> {
    AiServiceConfig::from_lookup(|k| vars.get(k).cloned())
}

proptest! {
    #[test]
    fn temperature_inside_range_is_accepted(t in 0.0f32..=2.0) {
        let cfg = build_ai(&ai_vars(&[("AI_TEMPERATURE", t.to_string())])).unwrap();
        prop_assert!((cfg.temperature - t).abs() < 1e-6);
    }

    #[test]
    fn temperature_outside_range_is_rejected(t in prop_oneof![-100.0f32..-0.001, 2.001f32..100.0]) {
        let err = build_ai(&ai_vars(&[("AI_TEMPERATURE", t.to_string())])).unwrap_err();
        prop_assert_eq!(err.field(), "AI_TEMPERATURE");
    }

    #[test]
    fn any_u16_port_parses(port in any::<u16>()) {
        let cfg = ApplicationConfig::from_lookup(|k| {
            (k == "APP_PORT").then(|| port.to_string())
        }).unwrap();
        prop_assert_eq!(cfg.port, port);
    }

    #[test]
    fn non_numeric_port_is_rejected(raw in "[a-zA-Z]{1,8}") {
        let err = ApplicationConfig::from_lookup(|k| (k == "APP_PORT").then(|| raw.clone()))
            .unwrap_err();
        prop_assert_eq!(err.field(), "APP_PORT");
    }

    #[test]
    fn retry_settings_roundtrip(retries in 0u32..20, delay_ms in 0u64..10_000) {
        let secs = delay_ms as f64 / 1000.0;
        let cfg = build_ai(&ai_vars(&[
            ("AI_MAX_RETRIES", retries.to_string()),
            ("AI_RETRY_DELAY", secs.to_string()),
        ])).unwrap();
        prop_assert_eq!(cfg.max_retries, retries);
        prop_assert!((cfg.retry_delay.as_secs_f64() - secs).abs() < 1e-6);
    }

    #[test]
    fn story_length_validation_matches_range(minutes in 0u8..=20) {
        let req: StoryRequest = serde_json::from_value(serde_json::json!({
            "child": {"id": "c-1"},
            "moral": "kindness",
            "story_length_minutes": minutes,
        })).unwrap();
        prop_assert_eq!(req.validate().is_ok(), (1..=10).contains(&minutes));
    }
}
