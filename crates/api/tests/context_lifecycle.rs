//! Lifecycle tests for the application context
//!
//! Spins the full wiring (context → service → HTTP adapters) against a
//! wiremock backend and a scratch session mirror.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uninest_domain::{
    Config, HttpConfig, Identity, ProviderConfig, Session, SessionConfig, UserProfile, UserRole,
};
use uninest_infra::{FileSessionStore, SessionStore};
use uninest_lib::{commands, AppContext};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str, store_path: &std::path::Path) -> Config {
    Config {
        provider: ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "anon-key".into(),
            oauth_redirect_url: "https://app.uninest.test/onboarding".into(),
        },
        http: HttpConfig { timeout_seconds: 5 },
        session: SessionConfig {
            store_path: store_path.to_string_lossy().into_owned(),
            refresh_threshold_seconds: 300,
        },
    }
}

fn stored_session() -> Session {
    Session {
        identity: Identity {
            id: "user-1".into(),
            email: "ada@uninest.app".into(),
            full_name: Some("Ada Okafor".into()),
            given_name: None,
            family_name: None,
            avatar_url: None,
        },
        access_token: "jwt-access".into(),
        refresh_token: Some("jwt-refresh".into()),
        expires_at: Some(Utc::now() + chrono::Duration::seconds(3600)),
    }
}

fn stored_profile(role: UserRole) -> UserProfile {
    UserProfile {
        id: "user-1".into(),
        email: "ada@uninest.app".into(),
        role,
        first_name: "Ada".into(),
        last_name: "Okafor".into(),
        phone_number: None,
        profile_image: None,
        verified: true,
        default_landlord_id: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn starts_signed_out_without_a_stored_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(
        AppContext::new_with_config(test_config(&server.uri(), &dir.path().join("session.json")))
            .unwrap(),
    );

    let user = ctx.start().await;

    assert!(user.is_none());
    assert!(commands::session::current_user(&ctx).await.is_none());
    assert!(!commands::session::session_state(&ctx).await.loading);

    ctx.shutdown().await;
    // Shutdown is idempotent.
    ctx.shutdown().await;
}

#[tokio::test]
async fn restores_the_session_from_the_mirror() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.user-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![stored_profile(UserRole::Tenant)]),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("session.json");

    // A previous run left a live session behind.
    FileSessionStore::new(&store_path).save(&stored_session()).await.unwrap();

    let ctx =
        Arc::new(AppContext::new_with_config(test_config(&server.uri(), &store_path)).unwrap());

    let user = ctx.start().await.expect("session restored");

    assert_eq!(user.id, "user-1");
    assert_eq!(user.role, UserRole::Tenant);
    assert_eq!(commands::session::current_user(&ctx).await.unwrap().id, "user-1");

    ctx.shutdown().await;
}

#[tokio::test]
async fn sign_in_and_out_through_the_command_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-access",
            "refresh_token": "jwt-refresh",
            "expires_in": 3600,
            "user": {
                "id": "user-1",
                "email": "ada@uninest.app",
                "user_metadata": { "full_name": "Ada Okafor" }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![stored_profile(UserRole::Landlord)]),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(
        AppContext::new_with_config(test_config(&server.uri(), &dir.path().join("session.json")))
            .unwrap(),
    );
    ctx.start().await;

    let user = commands::session::sign_in(&ctx, "ada@uninest.app", "hunter2!").await.unwrap();
    assert_eq!(user.role, UserRole::Landlord);
    assert!(commands::session::current_user(&ctx).await.is_some());

    commands::session::sign_out(&ctx).await.unwrap();

    // The listener may still be draining the earlier sign-in event; the
    // state settles on signed-out once the queue is empty.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while commands::session::current_user(&ctx).await.is_some() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "user should clear after sign-out"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    ctx.shutdown().await;
}

#[tokio::test]
async fn google_login_url_targets_the_provider() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(
        AppContext::new_with_config(test_config(&server.uri(), &dir.path().join("session.json")))
            .unwrap(),
    );

    let url = commands::session::sign_in_with_google(&ctx).unwrap();

    assert!(url.starts_with(&format!("{}/auth/v1/authorize", server.uri())));
    assert!(url.contains("provider=google"));
    assert!(url.contains("onboarding"));
}
