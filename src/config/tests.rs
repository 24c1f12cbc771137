use super::*;

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.admission.cooldown, Duration::from_millis(4_000));
    assert_eq!(settings.admission.sweep_interval, Duration::from_secs(300));
    assert_eq!(settings.vision.endpoint, None);
    assert_eq!(settings.vision.model, "gemini-3-flash-preview");
    assert_eq!(settings.vision.timeout, Duration::from_secs(30));
    assert_eq!(settings.intake.tracking_prefix.as_str(), "TAVALL-");
    assert!(!settings.intake.record_errors);
    assert_eq!(settings.cache.stats_max_age_secs, 300);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.admission.cooldown_ms = Some(1_000);
    raw.logging.level = Some("info".to_string());
    raw.vision.model = Some("from-file".to_string());

    let overrides = GlobalOverrides {
        admission_cooldown_ms: Some(250),
        log_level: Some("debug".to_string()),
        vision_model: Some("from-cli".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.admission.cooldown, Duration::from_millis(250));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.vision.model, "from-cli");
}

#[test]
fn absent_overrides_keep_lower_layers() {
    let mut raw = RawSettings::default();
    raw.vision.timeout_ms = Some(5_000);

    raw.apply_overrides(&GlobalOverrides::default());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.vision.timeout, Duration::from_millis(5_000));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_durations_are_rejected() {
    let mut raw = RawSettings::default();
    raw.admission.cooldown_ms = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero cooldown");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "admission.cooldown_ms",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.vision.timeout_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.admission.sweep_interval_secs = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn tracking_prefix_must_be_blank_free_and_digit_free() {
    let mut raw = RawSettings::default();
    raw.intake.tracking_prefix = Some("   ".to_string());
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.intake.tracking_prefix = Some("ZX9-".to_string());
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.intake.tracking_prefix = Some("ZX-".to_string());
    let settings = Settings::from_raw(raw).expect("valid prefix");
    assert_eq!(settings.intake_config().tracking_prefix.as_str(), "ZX-");
}

#[test]
fn blank_endpoint_counts_as_unset() {
    let mut raw = RawSettings::default();
    raw.vision.endpoint = Some("  ".to_string());
    raw.vision.api_key = Some(" secret ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.vision.endpoint, None);
    assert_eq!(settings.vision.api_key.as_deref(), Some("secret"));
}

#[test]
fn intake_config_reflects_settings() {
    let mut raw = RawSettings::default();
    raw.intake.record_errors = Some(true);
    raw.admission.cooldown_ms = Some(900);

    let config = Settings::from_raw(raw)
        .expect("valid settings")
        .intake_config();
    assert!(config.record_errors);
    assert_eq!(config.cooldown, Duration::from_millis(900));
    assert_eq!(config.vision_timeout, Duration::from_secs(30));
}

#[test]
fn parse_scan_arguments() {
    let args = CliArgs::parse_from([
        "courier-intake",
        "scan",
        "a.txt",
        "b.txt",
        "--caller",
        "10.0.0.7",
        "--admission-cooldown-ms",
        "100",
    ]);

    match args.command {
        Command::Scan(scan) => {
            assert_eq!(scan.files.len(), 2);
            assert_eq!(scan.caller, "10.0.0.7");
            assert_eq!(scan.format, FrameFormat::Image);
        }
        _ => panic!("wrong command parsed"),
    }
    assert_eq!(args.overrides.admission_cooldown_ms, Some(100));
}

#[test]
fn scan_accepts_text_frames() {
    let args = CliArgs::parse_from(["courier-intake", "scan", "a.txt", "--format", "text"]);
    match args.command {
        Command::Scan(scan) => assert_eq!(scan.format, FrameFormat::Text),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_mint_defaults_to_one() {
    let args = CliArgs::parse_from(["courier-intake", "mint"]);
    match args.command {
        Command::Mint(mint) => assert_eq!(mint.count, 1),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn scan_requires_files_and_mint_rejects_zero() {
    assert!(CliArgs::try_parse_from(["courier-intake", "scan"]).is_err());
    assert!(CliArgs::try_parse_from(["courier-intake", "mint", "--count", "0"]).is_err());
}

#[test]
fn missing_explicit_config_file_fails() {
    let args = CliArgs::parse_from([
        "courier-intake",
        "--config-file",
        "/nonexistent/courier-intake.toml",
        "mint",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}
