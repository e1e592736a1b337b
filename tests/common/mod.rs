//! Test helpers for web integration tests.
//!
//! Builds the real router over an in-memory mail store, and runs a throwaway
//! verification service when a test needs the human-verification gate.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::header::SET_COOKIE, routing::post, Json, Router};
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use smail::config::{Config, TurnstileConfig};
use smail::web::handlers::AppState;
use smail::web::middleware::RateLimitState;
use smail::web::router::{create_health_router, create_router};
use smail::{Database, IdentityCodec};

/// Cookie signing secret used by every test server.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Mailbox domain used by every test server.
pub const TEST_DOMAIN: &str = "example.com";

/// Create a test configuration.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.web.cookie_secrets = vec![TEST_SECRET.to_string()];
    config.web.create_rate_limit = 1000;
    config.mailbox.domain = TEST_DOMAIN.to_string();
    config
}

/// A router under test together with its mail store.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub config: Config,
}

impl TestApp {
    /// Codec matching the server's cookie settings.
    pub fn codec(&self) -> IdentityCodec {
        IdentityCodec::new(
            &self.config.web.cookie_secrets,
            self.config.mailbox.max_identities,
        )
        .unwrap()
    }

    /// Insert a received message into the mail store.
    pub async fn insert_mail(&self, id: &str, to: &str, subject: &str, created_at: &str) {
        sqlx::query(
            "INSERT INTO emails (id, message_from, message_to, subject, text, created_at)
             VALUES (?, 'sender@remote.test', ?, ?, 'body', ?)",
        )
        .bind(id)
        .bind(to)
        .bind(subject)
        .bind(created_at)
        .execute(self.db.pool())
        .await
        .unwrap();
    }

    /// Submit the creation form with an optional identity cookie.
    pub async fn create(&self, display_name: &str, identity_cookie: Option<&str>) -> TestResponse {
        self.create_with_form(&[("displayName", display_name)], identity_cookie)
            .await
    }

    /// Submit arbitrary creation form fields.
    pub async fn create_with_form(
        &self,
        form: &[(&str, &str)],
        identity_cookie: Option<&str>,
    ) -> TestResponse {
        let mut request = self.server.post("/").form(&form);
        if let Some(value) = identity_cookie {
            request = request.add_header(
                axum::http::header::COOKIE,
                format!("identity-list={value}"),
            );
        }
        request.await
    }

    /// Fetch the mailbox page with optional cookies.
    pub async fn view(&self, identity_cookie: Option<&str>, current: Option<&str>) -> Value {
        let mut pairs = Vec::new();
        if let Some(value) = identity_cookie {
            pairs.push(format!("identity-list={value}"));
        }
        if let Some(value) = current {
            pairs.push(format!("current-identity={value}"));
        }

        let mut request = self.server.get("/");
        if !pairs.is_empty() {
            request = request.add_header(axum::http::header::COOKIE, pairs.join("; "));
        }

        let response = request.await;
        response.assert_status_ok();
        response.json::<Value>()
    }
}

/// Create a test app with the given configuration.
pub async fn create_test_app_with(config: Config) -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let app_state =
        Arc::new(AppState::from_config(&config, db.clone()).expect("Failed to create app state"));
    let rate_limit = Arc::new(RateLimitState::new(
        config.web.create_rate_limit,
        config.web.trust_proxy_headers,
    ));

    let router = create_router(app_state, rate_limit, &config.web.cors_origins)
        .merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, db, config }
}

/// Create a test app with verification disabled.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config()).await
}

/// Create a test app whose verification gate talks to `fake`.
pub async fn create_gated_test_app(fake: &FakeSiteverify) -> TestApp {
    let mut config = create_test_config();
    config.turnstile = TurnstileConfig {
        enabled: true,
        site_key: "test-site-key".to_string(),
        secret: "test-turnstile-secret".to_string(),
        verify_endpoint: fake.endpoint.clone(),
        timeout_secs: 5,
    };
    create_test_app_with(config).await
}

/// Cookies set by a response, keyed by name, with values decoded.
pub fn set_cookies(response: &TestResponse) -> HashMap<String, String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse_encoded(v.to_string()).ok())
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

/// Raw `Set-Cookie` header for the named cookie.
pub fn set_cookie_header(response: &TestResponse, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

/// Stand-in for the external verification service.
#[derive(Clone)]
pub struct FakeSiteverify {
    pub endpoint: String,
    calls: Arc<AtomicUsize>,
}

impl FakeSiteverify {
    /// Number of verification requests received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct FakeState {
    success: bool,
    calls: Arc<AtomicUsize>,
}

async fn siteverify(State(state): State<FakeState>, Json(_body): Json<Value>) -> Json<Value> {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if state.success {
        Json(json!({"success": true}))
    } else {
        Json(json!({"success": false, "error-codes": ["invalid-input-response"]}))
    }
}

/// Start a verification service that answers every proof with `success`.
pub async fn spawn_fake_siteverify(success: bool) -> FakeSiteverify {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/siteverify", post(siteverify))
        .with_state(FakeState {
            success,
            calls: calls.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeSiteverify {
        endpoint: format!("http://{addr}/siteverify"),
        calls,
    }
}
