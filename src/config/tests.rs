use std::env;

use super::*;

const FULL_CONFIG: &str = r#"{
    "output_stamped": true,
    "frame_id": "base_link",
    "topics": [
        { "name": "navigation", "topic": "nav_vel", "timeout": 0.5, "priority": 10 },
        { "name": "joystick", "topic": "joy_vel", "timeout": 0.5, "priority": 100, "stamped_topic": true },
        { "name": "keyboard", "topic": "key_vel", "timeout": 0.5, "priority": 90 }
    ],
    "locks": [
        { "name": "pause", "topic": "pause_navigation", "timeout": 10.0, "priority": 100 },
        { "name": "joystick", "topic": "joy_priority", "timeout": 0.0, "priority": 200 }
    ]
}"#;

mod json {
    use super::*;

    #[test]
    fn parses_sources_in_declaration_order() {
        let config = MuxConfig::from_json_str(FULL_CONFIG).unwrap();

        let names: Vec<_> = config.velocity_sources().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["navigation", "joystick", "keyboard"]);

        let joystick = &config.velocity_sources()[1];
        assert_eq!(joystick.topic(), "joy_vel");
        assert_eq!(joystick.priority(), Priority::from(100u8));
        assert_eq!(joystick.timeout(), Timeout::from_millis(500));
        assert!(joystick.stamped());
        assert_eq!(joystick.kind(), CommandKind::Timestamped);
        assert!(!config.velocity_sources()[0].stamped());

        // Lock and source namespaces are independent.
        let locks: Vec<_> = config.lock_sources().iter().map(|l| l.name()).collect();
        assert_eq!(locks, vec!["pause", "joystick"]);
        assert_eq!(config.lock_sources()[1].timeout(), Timeout::ZERO);

        assert_eq!(
            config.output_mode(),
            &OutputMode::Timestamped {
                frame_id: "base_link".to_string()
            }
        );
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let config = MuxConfig::from_json_str("{}").unwrap();

        assert!(config.velocity_sources().is_empty());
        assert!(config.lock_sources().is_empty());
        assert_eq!(config.output_mode(), &OutputMode::Bare);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = MuxConfig::from_json_str(
            r#"{ "topics": [ { "name": "a", "topic": "a", "timeout": 1.0, "priority": 1, "colour": "red" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = MuxConfig::from_json_str(r#"{ "use_stamped": true }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_and_duplicated_fields_are_rejected() {
        let err = MuxConfig::from_json_str(
            r#"{ "topics": [ { "name": "a", "topic": "a", "priority": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = MuxConfig::from_json_str(
            r#"{ "topics": [ { "name": "a", "topic": "a", "timeout": 1.0, "priority": 1, "priority": 2 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn malformed_priority_and_timeout_are_rejected() {
        let err = MuxConfig::from_json_str(
            r#"{ "topics": [ { "name": "a", "topic": "a", "timeout": 1.0, "priority": -3 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPriority { ref name, .. } if name == "a"));

        let err = MuxConfig::from_json_str(
            r#"{ "locks": [ { "name": "stop", "topic": "stop", "timeout": -1.0, "priority": 3 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { ref name, .. } if name == "stop"));

        let err = MuxConfig::from_json_str(
            r#"{ "topics": [ { "name": "a", "topic": "a", "timeout": 1.0, "priority": 1.5 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = MuxConfig::from_json_str(
            r#"{ "topics": [
                { "name": "a", "topic": "a1", "timeout": 1.0, "priority": 1 },
                { "name": "a", "topic": "a2", "timeout": 1.0, "priority": 2 }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVelocitySource(ref name) if name == "a"));
    }

    #[test]
    fn empty_identity_is_rejected() {
        let err = MuxConfig::from_json_str(
            r#"{ "topics": [ { "name": "", "topic": "a", "timeout": 1.0, "priority": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName));

        let err = MuxConfig::from_json_str(
            r#"{ "locks": [ { "name": "stop", "topic": "", "timeout": 1.0, "priority": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTopic { ref name } if name == "stop"));
    }
}

mod file {
    use super::*;

    #[test]
    fn reads_config_from_disk() {
        let path = env::temp_dir().join(format!("twistmux-config-{}.json", std::process::id()));
        fs::write(&path, FULL_CONFIG).unwrap();

        let config = MuxConfig::from_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.velocity_sources().len(), 3);
        assert_eq!(config.lock_sources().len(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let path = env::temp_dir().join("twistmux-config-does-not-exist.json");

        let err = MuxConfig::from_json_file(&path).unwrap_err();
        match err {
            ConfigError::Io { path: err_path, .. } => assert_eq!(err_path, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}

mod builder {
    use super::*;

    #[test]
    fn rejects_duplicate_lock_names() {
        let lock = LockSourceConfig::new("estop", "estop", Timeout::from_millis(2_000), 10u8.into())
            .unwrap();

        let err = MuxConfig::default()
            .with_lock_source(lock.clone())
            .unwrap()
            .with_lock_source(lock)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLockSource(ref name) if name == "estop"));
    }

    #[test]
    fn with_output_mode_overrides_default() {
        let mode = OutputMode::Timestamped {
            frame_id: String::new(),
        };
        let config = MuxConfig::default().with_output_mode(mode.clone());
        assert_eq!(config.output_mode(), &mode);
    }
}
