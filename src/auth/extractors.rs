use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    error::AppError,
    session::{new_token, read_cookie, session_cookie, FlashLevel, SessionData},
    state::AppState,
};

/// Session of the current request, loaded from the session cookie.
///
/// `token` is `None` for visitors without a live session; one is only
/// issued when something has to be stored (see [`CurrentSession::commit`]).
pub struct CurrentSession {
    pub token: Option<String>,
    pub data: SessionData,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = read_cookie(&parts.headers, &state.config.session.cookie_name) else {
            return Ok(Self {
                token: None,
                data: SessionData::default(),
            });
        };

        // Unknown tokens (e.g. after a restart) are treated as anonymous.
        match state.sessions.get(&token).await? {
            Some(data) => Ok(Self {
                token: Some(token),
                data,
            }),
            None => Ok(Self {
                token: None,
                data: SessionData::default(),
            }),
        }
    }
}

impl CurrentSession {
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.data.flash(level, message);
    }

    /// Writes the session back to the store. Returns a `Set-Cookie` value when
    /// a new token had to be issued. Anonymous sessions with nothing left to
    /// show are dropped from the store.
    pub async fn commit(self, state: &AppState) -> Result<Option<HeaderValue>, AppError> {
        match self.token {
            Some(token) if self.data.is_empty() => {
                state.sessions.clear(&token).await?;
                Ok(None)
            }
            Some(token) => {
                state.sessions.set(&token, self.data).await?;
                Ok(None)
            }
            None if self.data.is_empty() => Ok(None),
            None => {
                let token = new_token();
                state.sessions.set(&token, self.data).await?;
                Ok(Some(session_cookie(&state.config.session, &token)?))
            }
        }
    }

    /// Commits the session and redirects to `to` (303).
    pub async fn redirect(self, state: &AppState, to: &str) -> Result<Response, AppError> {
        let cookie = self.commit(state).await?;
        Ok(with_cookie(cookie, Redirect::to(to)))
    }
}

pub fn with_cookie(cookie: Option<HeaderValue>, resp: impl IntoResponse) -> Response {
    let mut resp = resp.into_response();
    if let Some(cookie) = cookie {
        resp.headers_mut().append(header::SET_COOKIE, cookie);
    }
    resp
}
