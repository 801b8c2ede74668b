//! Integration tests for password change and recovery.

mod helpers;

use std::sync::Arc;

use chrono::Duration;

use looped_auth::password::PasswordHasher;
use looped_core::error::ErrorKind;
use looped_database::repositories::{StaffRepository, Visibility};
use looped_entity::staff::{StaffPatch, StaffRole};
use looped_notify::MailTemplate;
use looped_service::{ChangePasswordRequest, LoginRequest, ResetPasswordRequest, StaffPolicy};

use helpers::{GatedSessionStore, OTHER_PASSWORD, STRONG_PASSWORD, TestApp};

fn reset_request(email: &str, token: &str) -> ResetPasswordRequest {
    ResetPasswordRequest {
        email: email.to_string(),
        token: token.to_string(),
        new_password: OTHER_PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn test_forgot_password_same_shape_for_unknown_email() {
    let app = TestApp::new();
    app.register("Olive", "olive@x.com").await;

    let known = app.service.forgot_password("olive@x.com").await;
    let unknown = app.service.forgot_password("nobody@x.com").await;

    assert!(known.is_ok());
    assert!(unknown.is_ok());

    let sent = app.gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "olive@x.com");
    assert!(matches!(sent[0].template, MailTemplate::PasswordReset { .. }));
}

#[tokio::test]
async fn test_forgot_password_swallows_delivery_failure() {
    let app = TestApp::new();
    app.register("Olive", "olive@x.com").await;
    app.gateway.fail(true);

    app.service.forgot_password("olive@x.com").await.unwrap();
}

#[tokio::test]
async fn test_forgot_password_ignores_pending_accounts() {
    let app = TestApp::new();
    app.invite("alice@x.com", StaffRole::Author).await;

    app.service.forgot_password("alice@x.com").await.unwrap();
    assert_eq!(app.gateway.sent().len(), 1);
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = TestApp::new();
    app.register("Olive", "olive@x.com").await;
    let before = app.login("olive@x.com", STRONG_PASSWORD).await.unwrap();

    app.service.forgot_password("olive@x.com").await.unwrap();
    let token = app.gateway.last_code_for("olive@x.com").unwrap();

    app.clock.advance(Duration::hours(2));
    app.service
        .reset_password(reset_request("olive@x.com", &token))
        .await
        .unwrap();

    assert!(app.service.authenticate(&before.token).await.is_err());
    assert!(app.login("olive@x.com", STRONG_PASSWORD).await.is_err());
    app.login("olive@x.com", OTHER_PASSWORD).await.unwrap();

    let err = app
        .service
        .reset_password(reset_request("olive@x.com", &token))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::ResetTokenInvalid));
}

#[tokio::test]
async fn test_reset_token_expiry_is_strict() {
    let app = TestApp::new();
    let olive = app.register("Olive", "olive@x.com").await;
    app.service.forgot_password("olive@x.com").await.unwrap();
    let token = app.gateway.last_code_for("olive@x.com").unwrap();
    let expiry = olive.created_at + Duration::hours(24);

    app.clock.set(expiry);
    let err = app
        .service
        .reset_password(reset_request("olive@x.com", &token))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::ResetTokenExpired));

    let err = app
        .service
        .reset_password(reset_request("olive@x.com", "forged"))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::ResetTokenInvalid));

    app.clock.set(expiry - Duration::seconds(1));
    app.service
        .reset_password(reset_request("olive@x.com", &token))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_for_unknown_email_is_invalid_token() {
    let app = TestApp::new();

    let err = app
        .service
        .reset_password(reset_request("nobody@x.com", "anything"))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::ResetTokenInvalid));
}

#[tokio::test]
async fn test_change_password_keeps_current_session() {
    let app = TestApp::new();
    let olive = app.register("Olive", "olive@x.com").await;
    let current = app.login("olive@x.com", STRONG_PASSWORD).await.unwrap();
    let other = app.login("olive@x.com", STRONG_PASSWORD).await.unwrap();

    let err = app
        .service
        .change_password(
            olive.id,
            ChangePasswordRequest {
                current_password: "not-my-password".to_string(),
                new_password: OTHER_PASSWORD.to_string(),
            },
            Some(current.session_id),
        )
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::InvalidCredentials));

    app.service
        .change_password(
            olive.id,
            ChangePasswordRequest {
                current_password: STRONG_PASSWORD.to_string(),
                new_password: OTHER_PASSWORD.to_string(),
            },
            Some(current.session_id),
        )
        .await
        .unwrap();

    assert!(app.service.authenticate(&current.token).await.is_ok());
    assert!(app.service.authenticate(&other.token).await.is_err());
    app.login("olive@x.com", OTHER_PASSWORD).await.unwrap();
}

#[tokio::test]
async fn test_change_password_rejects_reuse() {
    let app = TestApp::new();
    let olive = app.register("Olive", "olive@x.com").await;

    let err = app
        .service
        .change_password(
            olive.id,
            ChangePasswordRequest {
                current_password: STRONG_PASSWORD.to_string(),
                new_password: STRONG_PASSWORD.to_string(),
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
}

#[tokio::test]
async fn test_stale_writer_gets_conflict() {
    let app = TestApp::new();
    let olive = app.register("Olive", "olive@x.com").await;

    // Another writer bumps the version between read and write.
    app.repo
        .update(olive.id, olive.version, StaffPatch::default(), olive.created_at)
        .await
        .unwrap();
    let err = app
        .repo
        .update(
            olive.id,
            olive.version,
            StaffPatch {
                name: Some("Stale".to_string()),
                ..StaffPatch::default()
            },
            olive.created_at,
        )
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));

    let current = app
        .repo
        .find_by_id(olive.id, Visibility::Live)
        .await
        .unwrap();
    assert_eq!(current.name, "Olive");
}

#[tokio::test]
async fn test_concurrent_acceptance_has_single_winner() {
    let app = Arc::new(TestApp::new());
    let (_, code) = app.invite("alice@x.com", StaffRole::Author).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let app = Arc::clone(&app);
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            app.service
                .accept_invite(app.accept_request("alice@x.com", &code))
                .await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) => assert!(e.is(ErrorKind::Conflict) || e.is(ErrorKind::InviteCodeInvalid)),
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test(start_paused = true)]
async fn test_forgot_password_takes_the_same_time_for_any_email() {
    let app = TestApp::new();
    app.register("Olive", "olive@x.com").await;
    let floor = StaffPolicy::default().forgot_password_floor;

    for email in ["olive@x.com", "nobody@x.com"] {
        let started = tokio::time::Instant::now();
        app.service.forgot_password(email).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= floor, "{email} answered after {elapsed:?}");
        assert!(elapsed < floor + std::time::Duration::from_millis(50));
    }
    assert_eq!(app.gateway.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_forgot_password_answers_at_floor_when_mail_hangs() {
    let app = TestApp::new();
    app.register("Olive", "olive@x.com").await;
    app.gateway.stall(true);
    let floor = StaffPolicy::default().forgot_password_floor;

    let started = tokio::time::Instant::now();
    app.service.forgot_password("olive@x.com").await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= floor);
    assert!(elapsed < floor + std::time::Duration::from_millis(50));
}

#[tokio::test]
async fn test_login_racing_password_change_gets_dead_session() {
    let store = Arc::new(GatedSessionStore::new());
    let app = TestApp::with_sessions(store.clone());
    let olive = app.register("Olive", "olive@x.com").await;

    store.arm();
    let service = app.service.clone();
    let login = tokio::spawn(async move {
        service
            .login(LoginRequest {
                email: "olive@x.com".to_string(),
                password: STRONG_PASSWORD.to_string(),
            })
            .await
    });
    store.entered.notified().await;

    app.service
        .change_password(
            olive.id,
            ChangePasswordRequest {
                current_password: STRONG_PASSWORD.to_string(),
                new_password: OTHER_PASSWORD.to_string(),
            },
            None,
        )
        .await
        .unwrap();
    store.release.notify_one();

    let stale = login.await.unwrap().unwrap();
    let err = app.service.authenticate(&stale.token).await.unwrap_err();
    assert!(err.is(ErrorKind::InvalidCredentials));

    let fresh = app.login("olive@x.com", OTHER_PASSWORD).await.unwrap();
    app.service.authenticate(&fresh.token).await.unwrap();
}

#[tokio::test]
async fn test_session_opened_under_replaced_hash_is_rejected() {
    let app = TestApp::new();
    let olive = app.register("Olive", "olive@x.com").await;
    let session = app.login("olive@x.com", STRONG_PASSWORD).await.unwrap();

    // A password write that never reached the session store.
    let rehashed = PasswordHasher::new().hash_password(OTHER_PASSWORD).unwrap();
    app.repo
        .update(
            olive.id,
            olive.version,
            StaffPatch {
                hashed_password: Some(rehashed),
                ..StaffPatch::default()
            },
            olive.created_at,
        )
        .await
        .unwrap();

    let err = app.service.authenticate(&session.token).await.unwrap_err();
    assert!(err.is(ErrorKind::InvalidCredentials));
}

#[tokio::test]
async fn test_reset_succeeds_when_revocation_fails() {
    let store = Arc::new(GatedSessionStore::new());
    let app = TestApp::with_sessions(store.clone());
    app.register("Olive", "olive@x.com").await;
    let before = app.login("olive@x.com", STRONG_PASSWORD).await.unwrap();

    app.service.forgot_password("olive@x.com").await.unwrap();
    let token = app.gateway.last_code_for("olive@x.com").unwrap();
    store.fail_revokes(true);
    app.service
        .reset_password(reset_request("olive@x.com", &token))
        .await
        .unwrap();

    let err = app.service.authenticate(&before.token).await.unwrap_err();
    assert!(err.is(ErrorKind::InvalidCredentials));
}
