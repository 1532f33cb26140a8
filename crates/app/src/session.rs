use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

/// Session credential as handed over by the host.
///
/// The subject claim is read without verifying the token signature. It is only
/// a cache key and must not drive authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    subject_id: Option<String>,
}

impl SessionIdentity {
    pub fn from_token(token: &str) -> Self {
        Self {
            subject_id: subject_from_token(token),
        }
    }

    pub fn with_subject(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { subject_id: None }
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    /// Account id portion of the subject (`auth0|user_123` -> `user_123`).
    pub fn user_id(&self) -> Option<&str> {
        let subject = self.subject_id.as_deref()?;
        let user = subject.rsplit('|').next()?;
        (!user.is_empty()).then_some(user)
    }
}

/// Reads the `sub` claim from a session token.
///
/// Accepts a bare JWT or the `<userId>%3A%3A<jwt>` / `<userId>::<jwt>` cookie form.
pub fn subject_from_token(token: &str) -> Option<String> {
    let token = token.trim();
    let jwt = token
        .rsplit_once("%3A%3A")
        .or_else(|| token.rsplit_once("::"))
        .map(|(_, jwt)| jwt)
        .unwrap_or(token);
    let payload = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims
        .get("sub")
        .and_then(Value::as_str)
        .filter(|sub| !sub.is_empty())
        .map(str::to_string)
}
