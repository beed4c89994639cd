//! Tests for FSM AI components.

#[cfg(test)]
mod tests {
    use super::super::config::{AIConfig, BossPhaseThresholds};
    use super::super::fsm::{BossPhase, CombatSubState, MainState};

    #[test]
    fn test_state_defaults() {
        assert_eq!(MainState::default(), MainState::Idle);
        assert_eq!(CombatSubState::default(), CombatSubState::None);
        assert_eq!(BossPhase::default(), BossPhase::NotBoss);
    }

    #[test]
    fn test_boss_phase_ordering() {
        assert!(BossPhase::NotBoss < BossPhase::Phase1);
        assert!(BossPhase::Phase1 < BossPhase::Phase2);
        assert!(BossPhase::Phase2 < BossPhase::Phase3);
        assert!(BossPhase::Phase3 < BossPhase::Enraged);
    }

    #[test]
    fn test_passive_states() {
        assert!(MainState::Idle.is_passive());
        assert!(MainState::Patrol.is_passive());
        assert!(!MainState::Combat.is_passive());
        assert!(!MainState::OutOfBounds.is_passive());
        assert!(!MainState::Dead.is_passive());
    }

    #[test]
    fn test_config_defaults() {
        let config = AIConfig::default();
        assert_eq!(config.min_attack_delay, 0.2);
        assert_eq!(config.max_attack_delay, 0.8);
        assert_eq!(config.post_attack_recovery, 0.25);
        assert_eq!(config.reposition_interval, 1.5);
        assert_eq!(config.phase2_health_threshold, 0.6);
        assert_eq!(config.phase3_health_threshold, 0.3);
        assert_eq!(config.enrage_health_threshold, 0.15);
        assert_eq!(config.punish_healing_chance, 0.8);
        assert!(!config.is_boss);
    }

    #[test]
    fn test_default_config_needs_no_sanitizing() {
        let (config, adjustments) = AIConfig::default().sanitized();
        assert!(adjustments.is_empty(), "{:?}", adjustments);
        assert_eq!(config, AIConfig::default());

        let (_, adjustments) = AIConfig::boss().sanitized();
        assert!(adjustments.is_empty(), "{:?}", adjustments);
    }

    #[test]
    fn test_sanitize_swapped_attack_delays() {
        let config = AIConfig {
            min_attack_delay: 1.0,
            max_attack_delay: 0.5,
            ..AIConfig::default()
        };

        let (config, adjustments) = config.sanitized();

        assert_eq!(config.max_attack_delay, 1.0);
        assert!(adjustments.iter().any(|a| a.field == "max_attack_delay"));
    }

    #[test]
    fn test_sanitize_negative_and_nan_values() {
        let config = AIConfig {
            sight_range: -5.0,
            poise_broken_duration: f32::NAN,
            punish_healing_chance: 1.7,
            ..AIConfig::default()
        };

        let (config, adjustments) = config.sanitized();

        assert_eq!(config.sight_range, AIConfig::default().sight_range);
        assert_eq!(config.poise_broken_duration, AIConfig::default().poise_broken_duration);
        assert_eq!(config.punish_healing_chance, 1.0);
        assert_eq!(adjustments.len(), 3);
    }

    #[test]
    fn test_sanitize_preferred_distance_inside_attack_range() {
        let config = AIConfig {
            attack_range: 4.0,
            preferred_combat_distance: 2.0,
            ..AIConfig::default()
        };

        let (config, _) = config.sanitized();
        assert_eq!(config.preferred_combat_distance, 4.0);
    }

    #[test]
    fn test_sanitize_non_descending_thresholds() {
        let config = AIConfig {
            phase2_health_threshold: 0.2,
            phase3_health_threshold: 0.5,
            ..AIConfig::default()
        };

        let (config, adjustments) = config.sanitized();

        assert_eq!(config.phase2_health_threshold, 0.6);
        assert_eq!(config.phase3_health_threshold, 0.3);
        assert_eq!(config.enrage_health_threshold, 0.15);
        assert_eq!(adjustments.len(), 3);
    }

    #[test]
    fn test_boss_thresholds_validation() {
        let good = BossPhaseThresholds { phase2: 0.7, phase3: 0.4, enrage: 0.1 };
        assert_eq!(good.validated(), Some(good));

        let ascending = BossPhaseThresholds { phase2: 0.2, phase3: 0.4, enrage: 0.1 };
        assert_eq!(ascending.validated(), None);

        let out_of_range = BossPhaseThresholds { phase2: 1.5, phase3: 0.4, enrage: 0.1 };
        assert_eq!(out_of_range.validated(), None);
    }

    #[test]
    fn test_wind_up_hold_disabled_without_input_reading() {
        let config = AIConfig {
            wind_up_hold_time: 0.4,
            enable_input_reading: false,
            ..AIConfig::default()
        };
        assert_eq!(config.effective_wind_up_hold(), 0.0);

        let config = AIConfig { enable_input_reading: true, ..config };
        assert_eq!(config.effective_wind_up_hold(), 0.4);
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{ "attack_range": 3.5, "is_boss": true }"#;
        let config: AIConfig = match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => panic!("config should parse: {}", e),
        };

        assert_eq!(config.attack_range, 3.5);
        assert!(config.is_boss);
        assert_eq!(config.sight_range, AIConfig::default().sight_range);
    }
}
