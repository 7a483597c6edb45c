//! "Add to Slack" install flow.
//!
//! `GET /slack/oauth/authorize` sends the installing admin to Slack with the
//! bot scopes Kudos needs. Slack redirects back to `GET /slack/oauth/callback`
//! with a one-time code, which is exchanged for tokens and stored in the
//! [`CredentialStore`]. From then on the workspace's events can be answered.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::{
    client::SlackClient,
    config::SlackConfig,
    credentials::{Credential, CredentialStore},
    error::{SlackError, SlackResult},
};

/// Bot scopes requested at install: read channel messages, post replies,
/// receive slash commands.
pub const REQUIRED_SCOPES: &[&str] = &[
    "channels:history",
    "groups:history",
    "chat:write",
    "commands",
];

/// Slack's authorization page.
pub const AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";

/// Everything the install routes need.
#[derive(Clone)]
pub struct OAuthState {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Must match the redirect URL registered for the app.
    pub redirect_uri: String,
    /// Client used for the code exchange.
    pub client: SlackClient,
    /// Where installed credentials are stored.
    pub store: Arc<CredentialStore>,
}

impl OAuthState {
    /// Build OAuth state from configuration.
    pub fn from_config(
        config: &SlackConfig,
        client: SlackClient,
        store: Arc<CredentialStore>,
    ) -> SlackResult<Self> {
        let client_id = config
            .client_id()
            .ok_or_else(|| SlackError::Config("SLACK_CLIENT_ID not set".to_string()))?;
        let client_secret = config
            .client_secret()
            .ok_or_else(|| SlackError::Config("SLACK_CLIENT_SECRET not set".to_string()))?;
        let redirect_uri = config
            .redirect_uri()
            .ok_or_else(|| SlackError::Config("SLACK_REDIRECT_URI not set".to_string()))?;

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: SecretString::new(client_secret.into()),
            redirect_uri: redirect_uri.to_string(),
            client,
            store,
        })
    }

    /// URL of the authorization page for this app.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&scope={}&redirect_uri={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&REQUIRED_SCOPES.join(",")),
            urlencoding::encode(&self.redirect_uri),
        )
    }
}

/// Query string Slack appends when redirecting back to us.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    /// Set instead of `code` when the user declined the install.
    pub error: Option<String>,
}

/// Body of `oauth.v2.access`.
///
/// `ok: false` responses carry only `error`; every other field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthTokenResponse {
    pub ok: bool,
    /// Bot token (xoxb-...).
    #[serde(default)]
    pub access_token: Option<String>,
    /// Comma-separated bot scopes actually granted.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub bot_user_id: Option<String>,
    /// Workspace the app was installed into.
    #[serde(default)]
    pub team: Option<OAuthTeam>,
    /// Installing user, with a user token when user scopes were requested.
    #[serde(default)]
    pub authed_user: Option<OAuthAuthedUser>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Workspace reference in a token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTeam {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Installing user in a token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthAuthedUser {
    pub id: String,
    /// User token (xoxp-...).
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Install routes, with their state already applied.
pub fn oauth_routes(state: OAuthState) -> Router {
    Router::new()
        .route("/slack/oauth/authorize", get(authorize))
        .route("/slack/oauth/callback", get(callback))
        .with_state(state)
}

async fn authorize(State(state): State<OAuthState>) -> Response {
    let url = state.authorize_url();
    debug!(url = %url, "Redirecting to Slack for install");
    Redirect::temporary(&url).into_response()
}

/// Exchange the install code and store the workspace's credential.
async fn callback(
    State(state): State<OAuthState>,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    if let Some(reason) = params.error {
        warn!(reason = %reason, "Install declined");
        return failure_page(&format!("Slack reported: {}", reason));
    }

    let Some(code) = params.code else {
        warn!("Install callback without a code");
        return failure_page("Missing authorization code.");
    };

    let token_response = match state
        .client
        .oauth_access(
            &state.client_id,
            state.client_secret.expose_secret(),
            &code,
            Some(&state.redirect_uri),
        )
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "oauth.v2.access call failed");
            return failure_page("Could not reach Slack to finish the install.");
        }
    };

    if !token_response.ok {
        let reason = token_response.error.as_deref().unwrap_or("unknown_error");
        error!(reason, "oauth.v2.access rejected the code");
        return failure_page(&format!("Slack rejected the install: {}", reason));
    }

    let Some(credential) = Credential::from_oauth(&token_response) else {
        error!("Token exchange response missing team or bot token");
        return failure_page("Slack returned an incomplete installation.");
    };

    let team_name = credential
        .team_name
        .clone()
        .unwrap_or_else(|| "your workspace".to_string());
    info!(workspace = %credential.workspace_id, team = %team_name, "OAuth installation complete");
    state.store.insert(credential);

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Kudos - Installation Successful</title></head>
<body>
<h1>Kudos Installed Successfully!</h1>
<p>Kudos has been installed to <strong>{}</strong>.</p>
<p>Thank a colleague with <code>@name++</code> in any channel Kudos is in.</p>
</body>
</html>"#,
        escape_html(&team_name)
    ))
    .into_response()
}

fn failure_page(detail: &str) -> Response {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Kudos - Installation Failed</title></head>
<body>
<h1>Installation Failed</h1>
<p>{}</p>
</body>
</html>"#,
        escape_html(detail)
    ))
    .into_response()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialResolver;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oauth_config() -> SlackConfig {
        SlackConfig::new("secret").with_oauth(
            "client-id",
            "client-secret",
            Some("https://example.com/slack/oauth/callback".to_string()),
        )
    }

    fn state_for(base_url: &str) -> OAuthState {
        OAuthState::from_config(
            &oauth_config(),
            SlackClient::new(base_url).unwrap(),
            Arc::new(CredentialStore::new()),
        )
        .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_required_scopes() {
        assert!(REQUIRED_SCOPES.contains(&"chat:write"));
        assert!(REQUIRED_SCOPES.contains(&"channels:history"));
        assert!(REQUIRED_SCOPES.contains(&"commands"));
        assert!(!REQUIRED_SCOPES.contains(&"app_mentions:read"));
    }

    #[test]
    fn test_oauth_state_missing_config() {
        let result = OAuthState::from_config(
            &SlackConfig::new("secret"),
            SlackClient::new("http://localhost").unwrap(),
            Arc::new(CredentialStore::new()),
        );
        assert!(matches!(result, Err(SlackError::Config(_))));
    }

    #[test]
    fn test_authorize_url() {
        let url = state_for("http://localhost").authorize_url();
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("chat%3Awrite"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com"));
    }

    #[tokio::test]
    async fn test_authorize_redirects() {
        let app = oauth_routes(state_for("http://localhost"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/slack/oauth/authorize")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with(AUTHORIZE_URL));
    }

    #[tokio::test]
    async fn test_callback_stores_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth.v2.access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "access_token": "xoxb-installed",
                "bot_user_id": "UBOT",
                "team": {"id": "T7", "name": "Acme"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = state_for(&server.uri());
        let store = Arc::clone(&state.store);
        let app = oauth_routes(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/slack/oauth/callback?code=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Acme"));

        let credential = store.resolve("T7").await.unwrap();
        assert_eq!(credential.bot_token(), "xoxb-installed");
        assert_eq!(credential.bot_user_id.as_deref(), Some("UBOT"));
    }

    #[tokio::test]
    async fn test_callback_error_param() {
        let state = state_for("http://localhost");
        let store = Arc::clone(&state.store);
        let app = oauth_routes(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/slack/oauth/callback?error=access_denied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(body_text(response).await.contains("Installation Failed"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_callback_rejected_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth.v2.access"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "invalid_code"})),
            )
            .mount(&server)
            .await;

        let state = state_for(&server.uri());
        let store = Arc::clone(&state.store);
        let app = oauth_routes(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/slack/oauth/callback?code=bad")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(body_text(response).await.contains("invalid_code"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&\""), "&lt;b&gt;&amp;&quot;");
    }
}
