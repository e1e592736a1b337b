//! Mailbox handlers.

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::mailbox::{CreateMailboxRequest, CreateOutcome};
use crate::web::cookies::{current_identity_value, identity_list_value};
use crate::web::dto::{
    ApiResponse, CreateMailboxForm, MailboxPageResponse, SelectMailboxForm, ValidatedForm,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::client_ip;

/// GET / - Mailboxes held by the client and their messages.
pub async fn view_mailboxes(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Json<ApiResponse<MailboxPageResponse>> {
    let view = state
        .mailbox
        .view(identity_list_value(&jar), current_identity_value(&jar))
        .await;

    Json(ApiResponse::new(MailboxPageResponse::from_view(
        view,
        state.turnstile_info(),
    )))
}

/// POST / - Create a mailbox.
///
/// Redirects to `/` whether or not a mailbox was added. Cookies are only set
/// when the list changed.
pub async fn create_mailbox(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    ValidatedForm(form): ValidatedForm<CreateMailboxForm>,
) -> Result<Response, ApiError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let request = CreateMailboxRequest {
        display_name: form.display_name,
        verification_proof: form.verification_proof,
        remote_ip: client_ip(&headers, peer, state.trust_proxy_headers),
    };

    let outcome = state
        .mailbox
        .create(identity_list_value(&jar), &request)
        .await?;

    match outcome {
        CreateOutcome::Created {
            identity,
            cookie_value,
        } => {
            let jar = jar
                .add(state.cookies.identity_list(cookie_value))
                .add(state.cookies.current_identity(identity.address));
            Ok((jar, Redirect::to("/")).into_response())
        }
        CreateOutcome::Unchanged => Ok(Redirect::to("/").into_response()),
    }
}

/// POST /current - Select one of the held mailboxes.
pub async fn select_mailbox(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedForm(form): ValidatedForm<SelectMailboxForm>,
) -> Result<Response, ApiError> {
    let held = state
        .mailbox
        .mailboxes(identity_list_value(&jar))
        .iter()
        .any(|m| m.address == form.address);
    if !held {
        return Err(ApiError::unprocessable("Mailbox is not held by this client"));
    }

    let jar = jar.add(state.cookies.current_identity(form.address));
    Ok((jar, Redirect::to("/")).into_response())
}
