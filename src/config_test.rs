use super::*;
use tempfile::TempDir;

#[test]
fn test_default_config_values() {
    let config = Config::default();

    // Model defaults
    assert_eq!(config.model.model, SpeechModel::WhisperBase);
    assert_eq!(config.model.language, "auto");

    // Limit defaults
    assert_eq!(config.limits.max_file_size_mb, 20);
    assert_eq!(config.limits.queue_capacity, 100);
    assert_eq!(config.limits.max_jobs_per_user, 3);
    assert_eq!(config.limits.workers, 2);

    // Processing defaults
    assert!((config.processing.estimated_secs_per_minute - 13.0).abs() < f32::EPSILON);

    // Telegram defaults
    assert!(config.telegram.token.is_empty());
    assert_eq!(config.telegram.api_url, "https://api.telegram.org");
}

#[test]
fn test_load_valid_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
[telegram]
token = "123:abc"

[model]
model = "whisper-small-en"
language = "en"

[limits]
max_file_size_mb = 50
queue_capacity = 10
max_jobs_per_user = 2
workers = 4
"#;

    std::fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from(&config_path).unwrap();

    assert_eq!(config.telegram.token, "123:abc");
    assert_eq!(config.model.model, SpeechModel::WhisperSmallEn);
    assert_eq!(config.model.language, "en");
    assert_eq!(config.limits.max_file_size_mb, 50);
    assert_eq!(config.limits.queue_capacity, 10);
    assert_eq!(config.limits.max_jobs_per_user, 2);
    assert_eq!(config.limits.workers, 4);
}

#[test]
fn test_missing_config_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent.toml");

    let config = Config::load_from(&config_path).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_invalid_toml_returns_error() {
    let invalid_toml = "this is not valid { toml [";

    let result = Config::parse(invalid_toml);

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("TOML"));
}

#[test]
fn test_invalid_model_name_returns_error() {
    let toml_content = r#"
[model]
model = "not-a-real-model"
"#;

    let result = Config::parse(toml_content);
    assert!(result.is_err());
}

#[test]
fn test_partial_config_uses_defaults_for_missing() {
    let partial_toml = r#"
[model]
model = "whisper-tiny"
"#;

    let config = Config::parse(partial_toml).unwrap();

    // Specified value
    assert_eq!(config.model.model, SpeechModel::WhisperTiny);
    // Default values for unspecified fields
    assert_eq!(config.model.language, "auto");
    assert_eq!(config.limits.queue_capacity, 100);
    assert_eq!(config.telegram.api_url, "https://api.telegram.org");
}

#[test]
fn test_config_paths() {
    // These should return valid paths on any system
    let config_dir = Config::config_dir().unwrap();
    let config_path = Config::config_path().unwrap();
    let data_dir = Config::data_dir().unwrap();
    let models_dir = Config::models_dir().unwrap();

    assert!(config_dir.ends_with("voxgram"));
    assert!(config_path.ends_with("config.toml"));
    assert!(data_dir.ends_with("voxgram"));
    assert!(models_dir.ends_with("models"));

    // Verify parent relationships
    assert_eq!(config_path.parent().unwrap(), config_dir);
    assert_eq!(models_dir.parent().unwrap(), data_dir);
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let original = Config {
        telegram: TelegramConfig {
            token: "42:token".to_string(),
            api_url: "https://example.invalid".to_string(),
        },
        model: ModelConfig {
            model: SpeechModel::WhisperMedium,
            language: "cs".to_string(),
        },
        limits: LimitsConfig {
            max_file_size_mb: 256,
            queue_capacity: 5,
            max_jobs_per_user: 1,
            workers: 8,
        },
        processing: ProcessingConfig {
            estimated_secs_per_minute: 20.0,
        },
        logging: LoggingConfig {
            level: LogLevel::Debug,
        },
    };

    original.save_to(&config_path).unwrap();
    let loaded = Config::load_from(&config_path).unwrap();

    assert_eq!(original, loaded);
}

#[test]
fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested/dir/config.toml");

    let config = Config::default();
    config.save_to(&config_path).unwrap();

    assert!(config_path.exists());
}

#[test]
fn test_speech_model_serialization() {
    let config = Config {
        model: ModelConfig {
            model: SpeechModel::WhisperLargeV3Turbo,
            ..Default::default()
        },
        ..Default::default()
    };

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("model = \"whisper-large-v3-turbo\""));
}

#[test]
fn test_speech_model_from_str_matches_serde_names() {
    assert_eq!(
        "whisper-base".parse::<SpeechModel>().unwrap(),
        SpeechModel::WhisperBase
    );
    assert_eq!(
        "whisper-large-v3".parse::<SpeechModel>().unwrap(),
        SpeechModel::WhisperLargeV3
    );
    assert!("base".parse::<SpeechModel>().is_err());
}

#[test]
fn test_empty_token_not_serialized() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();

    // Empty token should be omitted from output
    assert!(!toml_str.contains("token"));
}

#[test]
fn test_max_file_size_bytes() {
    let mut config = Config::default();
    config.limits.max_file_size_mb = 20;
    assert_eq!(config.max_file_size_bytes(), 20 * 1024 * 1024);
}

#[test]
fn test_log_level_directive() {
    assert_eq!(LogLevel::Info.as_directive(), "voxgram=info");
    assert_eq!(LogLevel::Trace.as_directive(), "voxgram=trace");
}
