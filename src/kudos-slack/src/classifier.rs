//! Request authentication and classification.
//!
//! [`EventClassifier::classify`] turns a raw inbound request into exactly one
//! [`ClassifiedEvent`], in this order:
//!
//! 1. the method must be POST
//! 2. timestamp and signature headers must be present and plausible
//! 3. the signature must match the body
//! 4. the body is decoded according to its `Content-Type`
//! 5. the decoded payload is discriminated into a variant
//!
//! Classification is pure CPU work and never touches the network.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::actions::{ACTION_TYPES, ActionForm, ActionPayload};
use crate::commands::SlashCommandPayload;
use crate::config::SlackConfig;
use crate::error::{AuthError, SlackError, SlackResult};
use crate::events::{
    ClassifiedEvent, EventEnvelope, MessageCallback, MessageEvent, Unhandled, UrlChallenge,
};
use crate::signature::SignedEnvelope;

/// An inbound HTTP request as received.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw body bytes, exactly as signed.
    pub body: Bytes,
}

impl InboundRequest {
    /// Create a new inbound request.
    pub fn new(method: Method, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            headers,
            body: body.into(),
        }
    }
}

/// Body encodings the classifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let media_type = value.split(';').next().unwrap_or("").trim();
    if media_type.eq_ignore_ascii_case("application/json") {
        Some(BodyKind::Json)
    } else if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        Some(BodyKind::Form)
    } else {
        None
    }
}

/// Authenticates and classifies inbound requests.
pub struct EventClassifier {
    signing_secret: SecretString,
}

impl std::fmt::Debug for EventClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventClassifier")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

impl EventClassifier {
    /// Create a classifier for the given signing secret.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: SecretString::new(signing_secret.into().into()),
        }
    }

    /// Create a classifier from configuration.
    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.signing_secret())
    }

    /// Authenticate a request and classify its payload.
    ///
    /// Fails with [`SlackError::Auth`] when the request cannot be
    /// authenticated and [`SlackError::Parse`] when an authentic body cannot
    /// be decoded.
    pub fn classify(&self, request: &InboundRequest) -> SlackResult<ClassifiedEvent> {
        self.authenticate(request)?;

        let event = match body_kind(&request.headers) {
            Some(BodyKind::Json) => classify_json(&request.body)?,
            Some(BodyKind::Form) => classify_form(&request.body)?,
            None => {
                let content_type = request
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("<none>");
                return Err(SlackError::Parse(format!(
                    "unsupported content type: {}",
                    content_type
                )));
            }
        };

        debug!(kind = event.kind(), workspace = ?event.workspace_id(), "Classified request");
        Ok(event)
    }

    fn authenticate(&self, request: &InboundRequest) -> Result<(), AuthError> {
        if request.method != Method::POST {
            warn!(method = %request.method, "Rejected request: expected POST");
            return Err(AuthError::BadMethod);
        }

        let envelope = SignedEnvelope::from_headers(&request.headers, &request.body)
            .inspect_err(|e| warn!(error = %e, "Rejected request headers"))?;

        if !envelope.verify(self.signing_secret.expose_secret().as_bytes()) {
            warn!(timestamp = envelope.timestamp, "Rejected request: bad signature");
            return Err(AuthError::InvalidSignature);
        }
        Ok(())
    }
}

fn classify_json(body: &[u8]) -> SlackResult<ClassifiedEvent> {
    let envelope: EventEnvelope = serde_json::from_slice(body)?;

    match envelope.envelope_type.as_str() {
        "url_verification" => {
            let challenge = envelope.challenge.ok_or_else(|| {
                SlackError::Parse("url_verification without challenge".to_string())
            })?;
            Ok(ClassifiedEvent::UrlChallenge(UrlChallenge { challenge }))
        }
        "event_callback" => {
            let event = envelope
                .event
                .ok_or_else(|| SlackError::Parse("event_callback without event".to_string()))?;
            let event_type = event
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("unknown")
                .to_string();

            match event_type.as_str() {
                "message" => {
                    let team_id = envelope.team_id.ok_or_else(|| {
                        SlackError::Parse("event_callback without team_id".to_string())
                    })?;
                    let event: MessageEvent = serde_json::from_value(event)?;
                    Ok(ClassifiedEvent::MessageCallback(MessageCallback {
                        team_id,
                        event_id: envelope.event_id,
                        event,
                    }))
                }
                other => Ok(ClassifiedEvent::Unhandled(Unhandled::new(format!(
                    "event_callback:{}",
                    other
                )))),
            }
        }
        other => Ok(ClassifiedEvent::Unhandled(Unhandled::new(other))),
    }
}

fn classify_form(body: &[u8]) -> SlackResult<ClassifiedEvent> {
    let fields: HashMap<String, String> = serde_urlencoded::from_bytes(body)?;

    if fields.contains_key("payload") {
        let form: ActionForm = serde_urlencoded::from_bytes(body)?;
        let value: serde_json::Value = serde_json::from_str(&form.payload)?;
        let payload_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("unknown")
            .to_string();

        if ACTION_TYPES.contains(&payload_type.as_str()) {
            let action: ActionPayload = serde_json::from_value(value)?;
            return Ok(ClassifiedEvent::InteractiveAction(action));
        }
        return Ok(ClassifiedEvent::Unhandled(Unhandled::new(payload_type)));
    }

    if fields.contains_key("command") {
        let command: SlashCommandPayload = serde_urlencoded::from_bytes(body)?;
        return Ok(ClassifiedEvent::SlashCommand(command));
    }

    Ok(ClassifiedEvent::Unhandled(Unhandled::new("form")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, sign};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-signing-secret";
    const TS: &str = "1531420618";
    const JSON: &str = "application/json";
    const FORM: &str = "application/x-www-form-urlencoded";

    fn signed(content_type: &str, body: &str) -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static(TS));
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign(body.as_bytes(), TS, SECRET.as_bytes())).unwrap(),
        );
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        InboundRequest::new(Method::POST, headers, body.to_string())
    }

    fn classify(request: &InboundRequest) -> SlackResult<ClassifiedEvent> {
        EventClassifier::new(SECRET).classify(request)
    }

    fn auth_error(result: SlackResult<ClassifiedEvent>) -> AuthError {
        match result {
            Err(SlackError::Auth(e)) => e,
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_url_challenge() {
        let body = r#"{"type":"url_verification","token":"t","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"}"#;
        match classify(&signed(JSON, body)).unwrap() {
            ClassifiedEvent::UrlChallenge(c) => {
                assert_eq!(c.challenge, "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_json_content_type_with_charset() {
        let body = r#"{"type":"url_verification","challenge":"abc"}"#;
        let event = classify(&signed("application/json; charset=utf-8", body)).unwrap();
        assert!(matches!(event, ClassifiedEvent::UrlChallenge(_)));
    }

    #[test]
    fn test_message_callback() {
        let body = r#"{"type":"event_callback","team_id":"T1","event_id":"Ev1","event":{"type":"message","user":"U1","text":"<@U9>++ nice work","channel":"C1","ts":"1.0"}}"#;
        match classify(&signed(JSON, body)).unwrap() {
            ClassifiedEvent::MessageCallback(msg) => {
                assert_eq!(msg.team_id, "T1");
                assert_eq!(msg.event_id.as_deref(), Some("Ev1"));
                assert_eq!(msg.event.text, "<@U9>++ nice work");
                assert!(msg.event.is_scorable());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_app_mention_is_unhandled() {
        // Mentions of the bot also arrive as a plain `message` in the channel.
        let body = r#"{"type":"event_callback","team_id":"T1","event":{"type":"app_mention","user":"U1","text":"<@UBOT> <@U2>++","channel":"C1","ts":"1.0"}}"#;
        match classify(&signed(JSON, body)).unwrap() {
            ClassifiedEvent::Unhandled(u) => assert_eq!(u.kind, "event_callback:app_mention"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edited_message_is_not_scorable() {
        let body = r#"{"type":"event_callback","team_id":"T1","event":{"type":"message","subtype":"message_changed","channel":"C1","ts":"1.0"}}"#;
        match classify(&signed(JSON, body)).unwrap() {
            ClassifiedEvent::MessageCallback(msg) => assert!(!msg.event.is_scorable()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_inner_event_unhandled() {
        let body = r#"{"type":"event_callback","team_id":"T1","event":{"type":"reaction_added"}}"#;
        match classify(&signed(JSON, body)).unwrap() {
            ClassifiedEvent::Unhandled(u) => assert_eq!(u.kind, "event_callback:reaction_added"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_envelope_unhandled() {
        let body = r#"{"type":"app_rate_limited","team_id":"T1"}"#;
        match classify(&signed(JSON, body)).unwrap() {
            ClassifiedEvent::Unhandled(u) => assert_eq!(u.kind, "app_rate_limited"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_slash_command() {
        let body = "team_id=T1&channel_id=C1&user_id=U1&command=%2Fping&text=";
        match classify(&signed(FORM, body)).unwrap() {
            ClassifiedEvent::SlashCommand(cmd) => {
                assert_eq!(cmd.command, "/ping");
                assert_eq!(cmd.team_id, "T1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interactive_action() {
        let payload = r#"{"type":"message_action","callback_id":"flag","team":{"id":"T1"},"user":{"id":"U1"},"channel":{"id":"C1"},"message":{"text":"hi"}}"#;
        let body = format!("payload={}", urlencoding::encode(payload));
        match classify(&signed(FORM, &body)).unwrap() {
            ClassifiedEvent::InteractiveAction(action) => {
                assert_eq!(action.callback_id(), Some("flag"));
                assert_eq!(action.team.id, "T1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_payload_type_unhandled() {
        let payload = r#"{"type":"view_submission","team":{"id":"T1"},"user":{"id":"U1"}}"#;
        let body = format!("payload={}", urlencoding::encode(payload));
        match classify(&signed(FORM, &body)).unwrap() {
            ClassifiedEvent::Unhandled(u) => assert_eq!(u.kind, "view_submission"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_form_without_command_unhandled() {
        let event = classify(&signed(FORM, "foo=bar")).unwrap();
        assert!(matches!(event, ClassifiedEvent::Unhandled(_)));
    }

    #[test]
    fn test_non_post_rejected() {
        let mut request = signed(JSON, r#"{"type":"url_verification","challenge":"x"}"#);
        request.method = Method::GET;
        assert_eq!(auth_error(classify(&request)), AuthError::BadMethod);
    }

    #[test]
    fn test_missing_headers_rejected() {
        let mut request = signed(JSON, "{}");
        request.headers.remove(SIGNATURE_HEADER);
        assert_eq!(auth_error(classify(&request)), AuthError::MissingHeaders);

        let mut request = signed(JSON, "{}");
        request.headers.remove(TIMESTAMP_HEADER);
        assert_eq!(auth_error(classify(&request)), AuthError::MissingHeaders);
    }

    #[test]
    fn test_tampered_body_rejected() {
        let mut request = signed(JSON, r#"{"type":"url_verification","challenge":"x"}"#);
        request.body = Bytes::from_static(br#"{"type":"url_verification","challenge":"y"}"#);
        assert_eq!(auth_error(classify(&request)), AuthError::InvalidSignature);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let request = signed(JSON, r#"{"type":"url_verification","challenge":"x"}"#);
        let result = EventClassifier::new("another-secret").classify(&request);
        assert_eq!(auth_error(result), AuthError::InvalidSignature);
    }

    #[test]
    fn test_signature_checked_before_decoding() {
        // Garbage body with a bad signature is an auth failure, not a parse failure.
        let mut request = signed(JSON, "not json");
        request.body = Bytes::from_static(b"still not json");
        assert_eq!(auth_error(classify(&request)), AuthError::InvalidSignature);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = classify(&signed(JSON, "not json"));
        assert!(matches!(result, Err(SlackError::Parse(_))));
    }

    #[test]
    fn test_challenge_without_token_is_parse_error() {
        let result = classify(&signed(JSON, r#"{"type":"url_verification"}"#));
        assert!(matches!(result, Err(SlackError::Parse(_))));
    }

    #[test]
    fn test_unsupported_content_type() {
        let result = classify(&signed("text/plain", "hello"));
        assert!(matches!(result, Err(SlackError::Parse(_))));

        let mut request = signed(JSON, "{}");
        request.headers.remove(header::CONTENT_TYPE);
        assert!(matches!(classify(&request), Err(SlackError::Parse(_))));
    }
}
