use axum::http::HeaderMap;

const ACTING_USER_HEADER: &str = "x-acting-user";

/// Pre-authenticated caller identity.
///
/// The engine performs no authentication itself; it trusts whatever
/// identity the transport layer resolved and stamps it into
/// `created_by`/`approved_by` fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Actor {
    pub login: String,
    is_system: bool,
}

impl Actor {
    pub fn user(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            is_system: false,
        }
    }

    pub fn system() -> Self {
        Self {
            login: "system".to_string(),
            is_system: true,
        }
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Resolve the acting user from the upstream-authenticated request
    /// headers, falling back to the system actor.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(ACTING_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .map(Actor::user)
            .unwrap_or_else(Actor::system)
    }
}
