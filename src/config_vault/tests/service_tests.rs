//! Service tests for configuration versioning and credential access.

use std::sync::Arc;

use crate::config_vault::{
    adapters::{aes::AesGcmCipher, memory::InMemoryConfigRepository},
    domain::{ConfigSettings, Credential, ModelProvider},
    ports::{ConfigRepository, ConfigRepositoryError},
    services::{ConfigVaultError, ConfigVaultService, CredentialProvider},
};
use crate::workspace::domain::{ProjectId, UserId};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = ConfigVaultService<InMemoryConfigRepository, AesGcmCipher, DefaultClock>;

struct Harness {
    repository: Arc<InMemoryConfigRepository>,
    service: Arc<TestService>,
    project_id: ProjectId,
    user_id: UserId,
}

#[fixture]
fn harness() -> Harness {
    let repository = Arc::new(InMemoryConfigRepository::new());
    let cipher = AesGcmCipher::from_key_bytes(&[42_u8; 32]).expect("32-byte key");
    Harness {
        service: Arc::new(ConfigVaultService::new(
            Arc::clone(&repository),
            Arc::new(cipher),
            Arc::new(DefaultClock),
        )),
        repository,
        project_id: ProjectId::new(),
        user_id: UserId::new(),
    }
}

fn model(name: &str) -> ConfigSettings {
    ConfigSettings::new(ModelProvider::OpenAi, name)
}

async fn assert_single_active(harness: &Harness) {
    let all = harness
        .repository
        .history(harness.project_id)
        .await
        .expect("history should load");
    assert_eq!(all.iter().filter(|config| config.is_active()).count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn versions_increase_and_only_latest_is_active(harness: Harness) {
    for name in ["gpt-4o-mini", "gpt-4o", "gpt-4"] {
        harness
            .service
            .create_or_update(harness.project_id, harness.user_id, model(name), None)
            .await
            .expect("creation should succeed");
        assert_single_active(&harness).await;
    }

    let active = harness
        .service
        .active_config(harness.project_id)
        .await
        .expect("active config exists");
    assert_eq!(active.version(), 3);
    assert_eq!(active.settings().model_name, "gpt-4");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_updates_keep_exactly_one_active_version(harness: Harness) {
    let service = Arc::clone(&harness.service);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let worker = Arc::clone(&service);
        let project_id = harness.project_id;
        let user_id = harness.user_id;
        handles.push(tokio::spawn(async move {
            worker
                .create_or_update(project_id, user_id, model("gpt-4o"), None)
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task should join")
            .expect("creation should succeed");
    }

    assert_single_active(&harness).await;
    let mut versions: Vec<u32> = harness
        .service
        .history(harness.project_id)
        .await
        .expect("history")
        .iter()
        .map(|config| config.version())
        .collect();
    versions.sort_unstable();
    assert_eq!(versions, (1..=8).collect::<Vec<u32>>());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rollback_appends_a_copy_of_the_target_version(harness: Harness) {
    let project_id = harness.project_id;
    harness
        .service
        .create_or_update(project_id, harness.user_id, model("gpt-4o-mini"), None)
        .await
        .expect("v1");
    harness
        .service
        .create_or_update(project_id, harness.user_id, model("gpt-4o"), None)
        .await
        .expect("v2");

    let rolled_back = harness
        .service
        .rollback(project_id, 1, harness.user_id)
        .await
        .expect("rollback should succeed");

    assert_eq!(rolled_back.version(), 3);
    let history = harness.service.history(project_id).await.expect("history");
    let summary: Vec<(u32, bool, &str)> = history
        .iter()
        .map(|config| {
            (
                config.version(),
                config.is_active(),
                config.settings().model_name.as_str(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (3, true, "gpt-4o-mini"),
            (2, false, "gpt-4o"),
            (1, false, "gpt-4o-mini"),
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rollback_to_missing_version_is_not_found(harness: Harness) {
    let result = harness
        .service
        .rollback(harness.project_id, 7, harness.user_id)
        .await;

    assert!(matches!(
        result,
        Err(ConfigVaultError::Repository(ConfigRepositoryError::VersionNotFound { version: 7, .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn credential_round_trips_through_internal_path_only(harness: Harness) {
    let secret = "sk-ant-api03/+=&%$#@!ünïcødé";
    let created = harness
        .service
        .create_or_update(
            harness.project_id,
            harness.user_id,
            model("gpt-4o"),
            Some(Credential::new(secret)),
        )
        .await
        .expect("creation should succeed");

    assert!(created.encrypted_credential().is_none());
    let active = harness
        .service
        .active_config(harness.project_id)
        .await
        .expect("active");
    assert!(active.encrypted_credential().is_none());
    assert!(
        harness
            .service
            .history(harness.project_id)
            .await
            .expect("history")
            .iter()
            .all(|config| config.encrypted_credential().is_none())
    );

    let stored = harness
        .repository
        .find_active(harness.project_id)
        .await
        .expect("lookup")
        .expect("active row");
    let blob = stored.encrypted_credential().expect("blob stored at rest");
    assert_ne!(blob.as_bytes(), secret.as_bytes());

    let decrypted = harness
        .service
        .credential(harness.project_id)
        .await
        .expect("credential should decrypt");
    assert_eq!(decrypted.expose(), secret);
}

#[rstest]
#[case(None)]
#[case(Some(Credential::new("")))]
#[tokio::test(flavor = "multi_thread")]
async fn missing_credentials_are_reported_distinctly(
    harness: Harness,
    #[case] credential: Option<Credential>,
) {
    harness
        .service
        .create_or_update(harness.project_id, harness.user_id, model("gpt-4o"), credential)
        .await
        .expect("creation should succeed");

    let result = harness.service.credential(harness.project_id).await;
    assert!(matches!(result, Err(ConfigVaultError::NoCredential(id)) if id == harness.project_id));

    let settings = harness
        .service
        .agent_settings(harness.project_id)
        .await
        .expect("settings without credential are valid");
    assert!(settings.credential.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_config_is_not_found_before_first_version(harness: Harness) {
    let result = harness.service.active_config(harness.project_id).await;
    assert!(matches!(result, Err(ConfigVaultError::NoActiveConfig(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_settings_store_nothing(harness: Harness) {
    let mut settings = model("gpt-4o");
    settings.temperature = -0.1;

    let result = harness
        .service
        .create_or_update(harness.project_id, harness.user_id, settings, None)
        .await;

    assert!(matches!(result, Err(ConfigVaultError::Validation(_))));
    assert!(harness.service.history(harness.project_id).await.expect("history").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_version_cannot_be_deleted(harness: Harness) {
    for name in ["gpt-4o-mini", "gpt-4o"] {
        harness
            .service
            .create_or_update(harness.project_id, harness.user_id, model(name), None)
            .await
            .expect("creation should succeed");
    }

    let refused = harness.service.delete_version(harness.project_id, 2).await;
    assert!(matches!(
        refused,
        Err(ConfigVaultError::Repository(ConfigRepositoryError::ActiveVersion { version: 2, .. }))
    ));

    harness
        .service
        .delete_version(harness.project_id, 1)
        .await
        .expect("inactive versions may be deleted");
    assert_eq!(harness.service.history(harness.project_id).await.expect("history").len(), 1);
}
