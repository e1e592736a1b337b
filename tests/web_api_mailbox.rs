//! Web API Mailbox Tests
//!
//! Integration tests for mailbox creation and the mailbox page.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{
    create_gated_test_app, create_test_app, create_test_app_with, create_test_config,
    set_cookie_header, set_cookies, spawn_fake_siteverify,
};
use smail::mailbox::add_if_absent;
use smail::{IdentityCodec, IdentityList};

/// Identity cookie value after creating each name in turn.
async fn create_all(app: &common::TestApp, names: &[&str]) -> String {
    let mut cookie: Option<String> = None;
    for name in names {
        let response = app.create(name, cookie.as_deref()).await;
        response.assert_status(StatusCode::SEE_OTHER);
        let cookies = set_cookies(&response);
        cookie = Some(cookies["identity-list"].clone());
    }
    cookie.unwrap()
}

fn addresses(page: &Value) -> Vec<String> {
    page["data"]["mailboxes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["address"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Create Mailbox Tests
// ============================================================================

#[tokio::test]
async fn test_create_first_mailbox() {
    let app = create_test_app().await;

    let response = app.create("alice", None).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");

    let cookies = set_cookies(&response);
    assert_eq!(cookies["current-identity"], "alice@example.com");

    let list = app.codec().decode(Some(&cookies["identity-list"]));
    assert_eq!(list.len(), 1);
    let identity = list.latest().unwrap();
    assert_eq!(identity.display_name, "alice");
    assert_eq!(identity.address, "alice@example.com");
    assert_eq!(identity.id.len(), 21);
}

#[tokio::test]
async fn test_identity_cookie_attributes() {
    let app = create_test_app().await;

    let response = app.create("alice", None).await;
    let header = set_cookie_header(&response, "identity-list").unwrap();

    assert!(header.contains("Path=/"));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Max-Age=2592000"));
    assert!(!header.contains("Secure"));
}

#[tokio::test]
async fn test_secure_cookies_when_configured() {
    let mut config = create_test_config();
    config.web.secure_cookies = true;
    let app = create_test_app_with(config).await;

    let response = app.create("alice", None).await;
    let header = set_cookie_header(&response, "identity-list").unwrap();
    assert!(header.contains("Secure"));
}

#[tokio::test]
async fn test_resubmit_same_name_sets_no_cookie() {
    let app = create_test_app().await;
    let cookie = create_all(&app, &["alice"]).await;

    let response = app.create("alice", Some(&cookie)).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_create_appends_in_order() {
    let app = create_test_app().await;
    let cookie = create_all(&app, &["alice", "bob", "carol"]).await;

    let page = app.view(Some(&cookie), None).await;
    assert_eq!(
        addresses(&page),
        vec!["alice@example.com", "bob@example.com", "carol@example.com"]
    );
}

#[tokio::test]
async fn test_create_is_case_sensitive() {
    let app = create_test_app().await;
    let cookie = create_all(&app, &["alice", "Alice"]).await;

    let page = app.view(Some(&cookie), None).await;
    assert_eq!(
        addresses(&page),
        vec!["alice@example.com", "Alice@example.com"]
    );
}

#[tokio::test]
async fn test_create_accepts_user_name_alias() {
    let app = create_test_app().await;

    let response = app.create_with_form(&[("userName", "bob")], None).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(set_cookies(&response)["current-identity"], "bob@example.com");
}

#[tokio::test]
async fn test_create_with_forged_cookie_starts_fresh() {
    let app = create_test_app().await;

    let response = app.create("alice", Some("forged.cookie.value")).await;

    response.assert_status(StatusCode::SEE_OTHER);
    let list = app.codec().decode(Some(&set_cookies(&response)["identity-list"]));
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn test_create_invalid_names() {
    let app = create_test_app().await;

    for name in ["", "two words", "alice@evil.test"] {
        let response = app.create(name, None).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(set_cookies(&response).is_empty(), "cookie set for {name:?}");
    }
}

#[tokio::test]
async fn test_create_name_too_long() {
    let app = create_test_app().await;

    let response = app.create(&"a".repeat(65), None).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_limit_reached() {
    let mut config = create_test_config();
    config.mailbox.max_identities = 2;
    let app = create_test_app_with(config).await;
    let cookie = create_all(&app, &["a", "b"]).await;

    let response = app.create("c", Some(&cookie)).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "You can hold at most 2 mailboxes");
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_create_long_names_until_cookie_full() {
    let app = create_test_app().await;
    let names: Vec<String> = (0..20).map(|i| format!("{i:0>64}")).collect();

    let mut cookie: Option<String> = None;
    let mut held = 0;
    for name in &names {
        let response = app.create(name, cookie.as_deref()).await;
        if response.status_code() != StatusCode::SEE_OTHER {
            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
            let body: Value = response.json();
            assert_eq!(
                body["error"]["message"],
                "Your mailbox list is full; no more mailboxes fit in this browser"
            );
            assert!(set_cookies(&response).is_empty());
            break;
        }

        let cookies = set_cookies(&response);
        let value = cookies
            .get("identity-list")
            .unwrap_or_else(|| panic!("mailbox {held} was not stored"))
            .clone();
        assert!("identity-list=".len() + value.len() <= 4096);
        cookie = Some(value);
        held += 1;
    }

    assert!(held > 0 && held < names.len());
    let page = app.view(cookie.as_deref(), None).await;
    assert_eq!(addresses(&page).len(), held);
}

#[tokio::test]
async fn test_create_rate_limited() {
    let mut config = create_test_config();
    config.web.create_rate_limit = 2;
    let app = create_test_app_with(config).await;

    app.create("a", None).await.assert_status(StatusCode::SEE_OTHER);
    app.create("b", None).await.assert_status(StatusCode::SEE_OTHER);

    let response = app.create("c", None).await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Viewing is not limited.
    app.view(None, None).await;
}

#[tokio::test]
async fn test_create_rate_limit_ignores_spoofed_forwarding() {
    let mut config = create_test_config();
    config.web.create_rate_limit = 2;
    let app = create_test_app_with(config).await;

    let mut statuses = Vec::new();
    for i in 0..10 {
        let response = app
            .server
            .post("/")
            .form(&[("displayName", format!("user{i}"))])
            .add_header(
                axum::http::HeaderName::from_static("x-forwarded-for"),
                format!("10.9.9.{i}"),
            )
            .await;
        statuses.push(response.status_code());
    }

    assert_eq!(&statuses[..2], &[StatusCode::SEE_OTHER; 2]);
    assert!(statuses[2..]
        .iter()
        .all(|status| *status == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_create_rate_limit_trusts_forwarding_when_enabled() {
    let mut config = create_test_config();
    config.web.create_rate_limit = 1;
    config.web.trust_proxy_headers = true;
    let app = create_test_app_with(config).await;

    for i in 0..3 {
        app.server
            .post("/")
            .form(&[("displayName", format!("user{i}"))])
            .add_header(
                axum::http::HeaderName::from_static("cf-connecting-ip"),
                format!("192.0.2.{i}"),
            )
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }
}

// ============================================================================
// Human Verification Tests
// ============================================================================

#[tokio::test]
async fn test_gate_enabled_missing_proof() {
    let fake = spawn_fake_siteverify(true).await;
    let app = create_gated_test_app(&fake).await;

    let response = app.create("alice", None).await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Failed to pass the turnstile");
    assert!(set_cookies(&response).is_empty());
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn test_gate_enabled_rejected_proof() {
    let fake = spawn_fake_siteverify(false).await;
    let app = create_gated_test_app(&fake).await;

    let response = app
        .create_with_form(
            &[("displayName", "alice"), ("verificationProof", "bad-token")],
            None,
        )
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn test_gate_enabled_accepted_proof() {
    let fake = spawn_fake_siteverify(true).await;
    let app = create_gated_test_app(&fake).await;

    let response = app
        .create_with_form(
            &[("displayName", "alice"), ("cf-turnstile-response", "good-token")],
            None,
        )
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(set_cookies(&response)["current-identity"], "alice@example.com");
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn test_gate_unreachable_rejects() {
    let mut config = create_test_config();
    config.turnstile.enabled = true;
    config.turnstile.secret = "secret".to_string();
    config.turnstile.verify_endpoint = "http://127.0.0.1:9/siteverify".to_string();
    config.turnstile.timeout_secs = 2;
    let app = create_test_app_with(config).await;

    let response = app
        .create_with_form(
            &[("displayName", "alice"), ("verificationProof", "token")],
            None,
        )
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_gate_disabled_ignores_proof() {
    let app = create_test_app().await;

    let response = app
        .create_with_form(
            &[("displayName", "alice"), ("verificationProof", "anything")],
            None,
        )
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
}

// ============================================================================
// Mailbox Page Tests
// ============================================================================

#[tokio::test]
async fn test_view_without_cookie() {
    let app = create_test_app().await;
    app.insert_mail("m1", "alice@example.com", "Hi", "2024-01-01 00:00:00")
        .await;

    let page = app.view(None, None).await;

    assert_eq!(
        page,
        json!({
            "data": {
                "mailboxes": [],
                "mails": [],
                "current": null,
                "turnstile": {"enabled": false, "site_key": ""}
            }
        })
    );
}

#[tokio::test]
async fn test_view_filters_to_held_addresses() {
    let app = create_test_app().await;
    app.insert_mail("m1", "alice@example.com", "For Alice", "2024-01-01 10:00:00")
        .await;
    app.insert_mail("m2", "bob@example.com", "For Bob", "2024-01-02 10:00:00")
        .await;
    app.insert_mail("m3", "carol@example.com", "For Carol", "2024-01-03 10:00:00")
        .await;
    let cookie = create_all(&app, &["alice", "bob"]).await;

    let page = app.view(Some(&cookie), Some("bob@example.com")).await;

    let mails = page["data"]["mails"].as_array().unwrap();
    let ids: Vec<&str> = mails.iter().map(|m| m["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["m2", "m1"]);
    assert!(mails.iter().all(|m| m["message_to"] != "carol@example.com"));
    assert_eq!(mails[0]["subject"], "For Bob");
    assert_eq!(page["data"]["current"], "bob@example.com");
    assert!(page["data"].get("notice").is_none());
}

#[tokio::test]
async fn test_view_with_invalid_cookie_is_empty() {
    let app = create_test_app().await;
    app.insert_mail("m1", "alice@example.com", "Hi", "2024-01-01 00:00:00")
        .await;

    for value in ["garbage", "a.b.c", "%%%"] {
        let page = app.view(Some(value), None).await;
        assert_eq!(page["data"]["mailboxes"], json!([]));
        assert_eq!(page["data"]["mails"], json!([]));
    }
}

#[tokio::test]
async fn test_view_cookie_from_other_secret_is_empty() {
    let app = create_test_app().await;
    let other = IdentityCodec::new(&["another-secret".to_string()], 20).unwrap();
    let list = add_if_absent(IdentityList::new(), "alice", "example.com").list;
    let foreign = other.encode(&list).unwrap();

    let page = app.view(Some(&foreign), None).await;
    assert_eq!(page["data"]["mailboxes"], json!([]));
}

#[tokio::test]
async fn test_view_store_failure_shows_notice() {
    let app = create_test_app().await;
    let cookie = create_all(&app, &["alice"]).await;
    app.db.close().await;

    let page = app.view(Some(&cookie), None).await;

    assert_eq!(addresses(&page), vec!["alice@example.com"]);
    assert_eq!(page["data"]["mails"], json!([]));
    assert_eq!(
        page["data"]["notice"],
        "Messages are temporarily unavailable"
    );
}

#[tokio::test]
async fn test_view_reports_turnstile_settings() {
    let fake = spawn_fake_siteverify(true).await;
    let app = create_gated_test_app(&fake).await;

    let page = app.view(None, None).await;
    assert_eq!(
        page["data"]["turnstile"],
        json!({"enabled": true, "site_key": "test-site-key"})
    );
}

// ============================================================================
// Select Mailbox Tests
// ============================================================================

#[tokio::test]
async fn test_select_held_mailbox() {
    let app = create_test_app().await;
    let cookie = create_all(&app, &["alice", "bob"]).await;

    let response = app
        .server
        .post("/current")
        .add_header(
            axum::http::header::COOKIE,
            format!("identity-list={cookie}"),
        )
        .form(&[("address", "alice@example.com")])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    let cookies = set_cookies(&response);
    assert_eq!(cookies["current-identity"], "alice@example.com");
    assert!(!cookies.contains_key("identity-list"));
}

#[tokio::test]
async fn test_select_unheld_mailbox() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/current")
        .form(&[("address", "someone@example.com")])
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(set_cookies(&response).is_empty());
}

// ============================================================================
// Health Tests
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
