use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashgate_core::{AppError, AppResult};
use dashgate_domain::{IdentityRecord, User, UserId};

use super::LoginRoleSynchronizer;
use crate::test_support::{TestDirectory, deployment_settings, roles};
use crate::{BaseAuthenticator, DirectoryAuthenticator};

fn identity(role_keys: &[&str]) -> IdentityRecord {
    IdentityRecord {
        name: "Jane Doe".to_owned(),
        email: "jane@contoso.com".to_owned(),
        external_id: "subject-1".to_owned(),
        username: "jane@contoso.com".to_owned(),
        first_name: "Jane".to_owned(),
        last_name: "Doe".to_owned(),
        role_keys: role_keys.iter().map(|key| (*key).to_owned()).collect(),
    }
}

fn directory_with_user(current_roles: &[&str]) -> Arc<TestDirectory> {
    let directory = Arc::new(TestDirectory::with_roles(&[
        "Admin", "Alpha", "Custom", "Gamma", "Partner",
    ]));
    directory.insert_user(User::new(
        UserId::new(),
        "jane@contoso.com",
        "Jane",
        "Doe",
        "jane@contoso.com",
        roles(current_roles),
    ));
    directory
}

fn synchronizer(directory: Arc<TestDirectory>, sync_at_login: bool) -> LoginRoleSynchronizer {
    let settings = Arc::new(deployment_settings(sync_at_login));
    let base = Arc::new(DirectoryAuthenticator::new(
        directory.clone(),
        settings.clone(),
    ));
    LoginRoleSynchronizer::new(base, directory, settings)
}

/// Base authenticator that records the sync flag it was called with.
struct RecordingBase {
    result: Option<User>,
    fail: bool,
    sync_flags: Mutex<Vec<bool>>,
}

#[async_trait]
impl BaseAuthenticator for RecordingBase {
    async fn authenticate_base(
        &self,
        _identity: &IdentityRecord,
        sync_roles_at_login: bool,
    ) -> AppResult<Option<User>> {
        self.sync_flags
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock flags: {error}")))?
            .push(sync_roles_at_login);

        if self.fail {
            return Err(AppError::Unauthorized("base authentication failed".to_owned()));
        }
        Ok(self.result.clone())
    }
}

#[tokio::test]
async fn sync_replaces_managed_roles_and_preserves_unmanaged_ones() {
    let directory = directory_with_user(&["Admin", "Custom"]);
    let service = synchronizer(directory.clone(), true);

    let result = service.authenticate(&identity(&["Gamma"])).await;

    let Ok(Some(user)) = result else {
        panic!("expected authenticated user");
    };
    assert_eq!(user.roles(), &roles(&["Custom", "Gamma", "Partner"]));
    assert_eq!(
        directory.user("jane@contoso.com").map(|user| user.roles().clone()),
        Some(roles(&["Custom", "Gamma", "Partner"]))
    );
}

#[tokio::test]
async fn sync_keeps_unmanaged_roles_granted_through_mapping_values() {
    // "Alpha" is only a mapping value, never a key, so it is not managed.
    let directory = directory_with_user(&["Alpha", "Admin"]);
    let service = synchronizer(directory, true);

    let result = service.authenticate(&identity(&[])).await;

    let Ok(Some(user)) = result else {
        panic!("expected authenticated user");
    };
    assert_eq!(user.roles(), &roles(&["Alpha", "Partner"]));
}

#[tokio::test]
async fn disabled_sync_leaves_existing_roles_unchanged() {
    let directory = directory_with_user(&["Admin", "Custom"]);
    let service = synchronizer(directory.clone(), false);

    let result = service.authenticate(&identity(&["Gamma"])).await;

    let Ok(Some(user)) = result else {
        panic!("expected authenticated user");
    };
    assert_eq!(user.roles(), &roles(&["Admin", "Custom"]));
    assert_eq!(directory.role_update_count(), 0);
    assert!(!service.roles_sync_at_login());
}

#[tokio::test]
async fn base_authenticator_always_runs_without_its_own_role_sync() {
    let base = Arc::new(RecordingBase {
        result: Some(User::new(
            UserId::new(),
            "jane@contoso.com",
            "Jane",
            "Doe",
            "jane@contoso.com",
            roles(&["Admin"]),
        )),
        fail: false,
        sync_flags: Mutex::new(Vec::new()),
    });
    let directory = directory_with_user(&["Admin"]);
    let service = LoginRoleSynchronizer::new(
        base.clone(),
        directory,
        Arc::new(deployment_settings(true)),
    );

    let result = service.authenticate(&identity(&["Admin"])).await;

    assert!(matches!(result, Ok(Some(_))));
    assert_eq!(
        base.sync_flags.lock().ok().map(|flags| flags.clone()),
        Some(vec![false])
    );
    assert!(service.roles_sync_at_login());
}

#[tokio::test]
async fn failed_base_authentication_is_propagated_and_sync_setting_is_untouched() {
    let directory = directory_with_user(&["Admin"]);

    let refusing = LoginRoleSynchronizer::new(
        Arc::new(RecordingBase {
            result: None,
            fail: false,
            sync_flags: Mutex::new(Vec::new()),
        }),
        directory.clone(),
        Arc::new(deployment_settings(true)),
    );
    assert!(matches!(refusing.authenticate(&identity(&["Admin"])).await, Ok(None)));
    assert!(refusing.roles_sync_at_login());

    let failing = LoginRoleSynchronizer::new(
        Arc::new(RecordingBase {
            result: None,
            fail: true,
            sync_flags: Mutex::new(Vec::new()),
        }),
        directory.clone(),
        Arc::new(deployment_settings(true)),
    );
    assert!(matches!(
        failing.authenticate(&identity(&["Admin"])).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(failing.roles_sync_at_login());
    assert_eq!(directory.role_update_count(), 0);
}

#[tokio::test]
async fn first_sign_in_with_sync_gets_provider_roles() {
    let directory = Arc::new(TestDirectory::with_roles(&["Admin", "Gamma", "Partner"]));
    let service = synchronizer(directory.clone(), true);

    let result = service.authenticate(&identity(&["Admin"])).await;

    let Ok(Some(user)) = result else {
        panic!("expected registered user");
    };
    assert_eq!(user.roles(), &roles(&["Admin", "Partner"]));
    assert_eq!(directory.login_count(), 1);
}
