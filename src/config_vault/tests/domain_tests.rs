//! Validation and serialisation tests for configuration values.

use crate::config_vault::domain::{
    ConfigDraft, ConfigSettings, ConfigValidationError, Credential, EncryptedCredential,
    ModelProvider, OpenCodeConfig,
};
use crate::workspace::domain::{ProjectId, UserId};
use mockable::DefaultClock;
use rstest::rstest;

fn openai() -> ConfigSettings {
    ConfigSettings::new(ModelProvider::OpenAi, "gpt-4o")
}

#[rstest]
#[case(ModelProvider::OpenAi, "gpt-4o-mini")]
#[case(ModelProvider::Anthropic, "claude-3-haiku-20240307")]
fn known_models_validate(#[case] provider: ModelProvider, #[case] model: &str) {
    assert_eq!(ConfigSettings::new(provider, model).validate(), Ok(()));
}

#[rstest]
fn unknown_provider_models_are_rejected() {
    let settings = ConfigSettings::new(ModelProvider::Anthropic, "gpt-4o");
    assert!(matches!(
        settings.validate(),
        Err(ConfigValidationError::UnsupportedModel { .. })
    ));
}

#[rstest]
#[case(None, ConfigValidationError::MissingEndpoint)]
#[case(Some("http://llm.internal/v1"), ConfigValidationError::InsecureEndpoint)]
fn custom_providers_need_https_endpoints(
    #[case] endpoint: Option<&str>,
    #[case] expected: ConfigValidationError,
) {
    let mut settings = ConfigSettings::new(ModelProvider::Custom, "local-llama");
    settings.api_endpoint = endpoint.map(ToOwned::to_owned);

    assert_eq!(settings.validate(), Err(expected));
}

#[rstest]
fn custom_provider_with_https_endpoint_validates() {
    let mut settings = ConfigSettings::new(ModelProvider::Custom, "local-llama");
    settings.api_endpoint = Some("https://llm.example.com/v1".to_owned());

    assert_eq!(settings.validate(), Ok(()));
}

#[rstest]
#[case::temperature(|s: &mut ConfigSettings| s.temperature = 2.5)]
#[case::tokens(|s: &mut ConfigSettings| s.max_tokens = 0)]
#[case::iterations(|s: &mut ConfigSettings| s.max_iterations = 51)]
#[case::timeout(|s: &mut ConfigSettings| s.timeout_seconds = 59)]
#[case::tool(|s: &mut ConfigSettings| s.enabled_tools.push("rm_rf".to_owned()))]
fn out_of_range_settings_are_rejected(#[case] mutate: fn(&mut ConfigSettings)) {
    let mut settings = openai();
    mutate(&mut settings);

    assert!(settings.validate().is_err());
}

#[rstest]
#[case("OpenAI", ModelProvider::OpenAi)]
#[case("anthropic", ModelProvider::Anthropic)]
#[case(" custom ", ModelProvider::Custom)]
fn providers_parse_case_insensitively(#[case] raw: &str, #[case] expected: ModelProvider) {
    assert_eq!(ModelProvider::try_from(raw), Ok(expected));
}

#[rstest]
fn serialised_configs_never_include_the_credential_blob() {
    let draft = ConfigDraft::new(
        ProjectId::new(),
        openai(),
        Some(EncryptedCredential::from_bytes(vec![1, 2, 3])),
        UserId::new(),
        &DefaultClock,
    );
    let config = OpenCodeConfig::activate(draft, 1);

    let json = serde_json::to_value(&config).expect("serialisable");

    assert!(config.encrypted_credential().is_some());
    let object = json.as_object().expect("config serialises as an object");
    assert!(!object.keys().any(|key| key.contains("encrypted") || key.contains("api_key")));
    assert_eq!(json.get("model_name").and_then(|v| v.as_str()), Some("gpt-4o"));
    assert_eq!(json.get("is_active").and_then(serde_json::Value::as_bool), Some(true));
}

#[rstest]
fn sanitized_copies_drop_the_credential() {
    let draft = ConfigDraft::new(
        ProjectId::new(),
        openai(),
        Some(EncryptedCredential::from_bytes(vec![9; 40])),
        UserId::new(),
        &DefaultClock,
    );
    let config = OpenCodeConfig::activate(draft, 3);

    let sanitized = config.sanitized();

    assert_eq!(sanitized.encrypted_credential(), None);
    assert_eq!(sanitized.version(), 3);
}

#[rstest]
fn credentials_are_redacted_in_debug_output() {
    let credential = Credential::new("sk-live-secret");
    assert!(!format!("{credential:?}").contains("sk-live-secret"));
}
