use std::sync::Arc;

use dashgate_domain::{IdentityRecord, User, UserId};

use super::{BaseAuthenticator, DirectoryAuthenticator};
use crate::test_support::{TestDirectory, deployment_settings, roles};

fn identity(username: &str, role_keys: &[&str]) -> IdentityRecord {
    IdentityRecord {
        name: "Jane Doe".to_owned(),
        email: "jane@contoso.com".to_owned(),
        external_id: "subject-1".to_owned(),
        username: username.to_owned(),
        first_name: "Jane".to_owned(),
        last_name: "Doe".to_owned(),
        role_keys: role_keys.iter().map(|key| (*key).to_owned()).collect(),
    }
}

fn directory() -> Arc<TestDirectory> {
    Arc::new(TestDirectory::with_roles(&[
        "Admin", "Alpha", "Gamma", "Partner",
    ]))
}

#[tokio::test]
async fn first_sign_in_registers_user_with_mapped_and_registration_roles() {
    let directory = directory();
    let authenticator =
        DirectoryAuthenticator::new(directory.clone(), Arc::new(deployment_settings(true)));

    let result = authenticator
        .authenticate_base(&identity("jane@contoso.com", &["User"]), false)
        .await;

    let Ok(Some(user)) = result else {
        panic!("expected registered user");
    };
    assert_eq!(user.username(), "jane@contoso.com");
    assert_eq!(user.first_name(), "Jane");
    assert_eq!(user.roles(), &roles(&["Alpha", "Gamma", "Partner"]));
    assert!(directory.user("jane@contoso.com").is_some());
    assert_eq!(directory.login_count(), 1);
}

#[tokio::test]
async fn registration_skips_roles_missing_from_directory() {
    let directory = Arc::new(TestDirectory::with_roles(&["Gamma"]));
    let authenticator =
        DirectoryAuthenticator::new(directory.clone(), Arc::new(deployment_settings(true)));

    let result = authenticator
        .authenticate_base(&identity("jane@contoso.com", &["User", "Admin"]), false)
        .await;

    let Ok(Some(user)) = result else {
        panic!("expected registered user");
    };
    assert_eq!(user.roles(), &roles(&["Gamma"]));
}

#[tokio::test]
async fn missing_email_gets_placeholder_address() {
    let directory = directory();
    let authenticator =
        DirectoryAuthenticator::new(directory.clone(), Arc::new(deployment_settings(true)));

    let mut identity = identity("jdoe", &[]);
    identity.email.clear();

    let result = authenticator.authenticate_base(&identity, false).await;
    let Ok(Some(user)) = result else {
        panic!("expected registered user");
    };
    assert_eq!(user.email(), "jdoe@email.notfound");
}

#[tokio::test]
async fn unknown_user_is_refused_when_registration_is_disabled() {
    let directory = directory();
    let mut settings = deployment_settings(true);
    settings.user_registration = false;
    let authenticator = DirectoryAuthenticator::new(directory.clone(), Arc::new(settings));

    let result = authenticator
        .authenticate_base(&identity("jane@contoso.com", &["Admin"]), false)
        .await;

    assert!(matches!(result, Ok(None)));
    assert!(directory.user("jane@contoso.com").is_none());
    assert_eq!(directory.login_count(), 0);
}

#[tokio::test]
async fn inactive_user_is_refused() {
    let directory = directory();
    directory.insert_user(
        User::new(
            UserId::new(),
            "jane@contoso.com",
            "Jane",
            "Doe",
            "jane@contoso.com",
            roles(&["Gamma"]),
        )
        .with_active(false),
    );
    let authenticator =
        DirectoryAuthenticator::new(directory.clone(), Arc::new(deployment_settings(true)));

    let result = authenticator
        .authenticate_base(&identity("jane@contoso.com", &["Admin"]), true)
        .await;

    assert!(matches!(result, Ok(None)));
    assert_eq!(directory.role_update_count(), 0);
}

#[tokio::test]
async fn identity_without_username_is_refused_even_with_email() {
    let directory = directory();
    let authenticator =
        DirectoryAuthenticator::new(directory.clone(), Arc::new(deployment_settings(true)));

    let identity = identity("  ", &["Admin"]);
    assert_eq!(identity.email, "jane@contoso.com");

    let result = authenticator.authenticate_base(&identity, false).await;
    assert!(matches!(result, Ok(None)));
    assert!(
        directory
            .users
            .lock()
            .ok()
            .map(|users| users.is_empty())
            .unwrap_or(false)
    );
}

#[tokio::test]
async fn existing_user_roles_follow_sync_flag_argument() {
    let directory = directory();
    directory.insert_user(User::new(
        UserId::new(),
        "jane@contoso.com",
        "Jane",
        "Doe",
        "jane@contoso.com",
        roles(&["Admin", "Alpha"]),
    ));
    let authenticator =
        DirectoryAuthenticator::new(directory.clone(), Arc::new(deployment_settings(true)));

    let unsynced = authenticator
        .authenticate_base(&identity("jane@contoso.com", &["Gamma"]), false)
        .await;
    let Ok(Some(user)) = unsynced else {
        panic!("expected existing user");
    };
    assert_eq!(user.roles(), &roles(&["Admin", "Alpha"]));
    assert_eq!(directory.role_update_count(), 0);

    let synced = authenticator
        .authenticate_base(&identity("jane@contoso.com", &["Gamma"]), true)
        .await;
    let Ok(Some(user)) = synced else {
        panic!("expected existing user");
    };
    assert_eq!(user.roles(), &roles(&["Gamma", "Partner"]));
    assert_eq!(directory.role_update_count(), 1);
    assert_eq!(directory.login_count(), 2);
}
