use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::{
    auth::{
        dto::{AuthStatus, PublicUser, UserProfile},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::AppError,
    session::{new_token, Session, SessionData},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::Internal(e.into()))
}

/// Unparsable timestamps become `None` instead of failing the caller.
pub(crate) fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!(error = %e, raw, "unparsable stored timestamp");
            None
        }
    }
}

async fn establish_session(state: &AppState, user: &User) -> Result<Session, AppError> {
    let token = new_token();
    let data = SessionData::for_user(user.id, &user.username);
    state.sessions.set(&token, data.clone()).await?;
    Ok(Session { token, data })
}

pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

fn validate_registration(reg: &Registration<'_>) -> Result<(), AppError> {
    if reg.username.is_empty()
        || reg.email.is_empty()
        || reg.password.is_empty()
        || reg.confirm_password.is_empty()
    {
        return Err(AppError::Validation("All fields are required".into()));
    }
    if !is_valid_email(reg.email) {
        warn!(email = reg.email, "email does not look like an address; accepting");
    }
    if reg.password != reg.confirm_password {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    if reg.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Creates the user row, then a session bound to it.
pub async fn register(
    state: &AppState,
    reg: Registration<'_>,
) -> Result<(Session, PublicUser), AppError> {
    let reg = Registration {
        username: reg.username.trim(),
        email: reg.email.trim(),
        ..reg
    };
    validate_registration(&reg).inspect_err(|e| warn!(reason = %e, "registration rejected"))?;

    if User::username_taken(&state.db, reg.username).await? {
        warn!(username = reg.username, "username already exists");
        return Err(AppError::Conflict("Username already exists".into()));
    }
    if User::email_taken(&state.db, reg.email).await? {
        warn!(email = reg.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(state.config.password_scheme, reg.password)?;
    let created_at = now_rfc3339()?;
    let user = User::create(&state.db, reg.username, reg.email, &hash, &created_at).await?;

    let session = establish_session(state, &user).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        session,
        PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        },
    ))
}

pub async fn login(state: &AppState, login: &str, password: &str) -> Result<Session, AppError> {
    let invalid = || AppError::Authentication("Invalid username or password".into());

    if login.is_empty() || password.is_empty() {
        warn!("login with empty credentials");
        return Err(invalid());
    }

    let Some(user) = User::find_by_login(&state.db, login).await? else {
        warn!(login, "login unknown user");
        return Err(invalid());
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(invalid());
        }
        Err(e) => {
            error!(user_id = user.id, error = %e, "stored password hash unreadable");
            return Err(invalid());
        }
    }

    User::touch_last_login(&state.db, user.id, &now_rfc3339()?).await?;
    let session = establish_session(state, &user).await?;
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(session)
}

/// Clears the session behind `token`. No token or an unknown token is a no-op.
pub async fn logout(state: &AppState, token: Option<&str>) -> Result<(), AppError> {
    if let Some(token) = token {
        state.sessions.clear(token).await?;
        debug!("session cleared");
    }
    Ok(())
}

pub fn check_auth(data: &SessionData) -> AuthStatus {
    match &data.user {
        Some(user) => AuthStatus {
            authenticated: true,
            username: user.username.clone(),
        },
        None => AuthStatus {
            authenticated: false,
            username: String::new(),
        },
    }
}

pub async fn get_profile(state: &AppState, data: &SessionData) -> Result<UserProfile, AppError> {
    let unauthenticated = || AppError::Authentication("Please log in to view your profile.".into());

    let session_user = data.user.as_ref().ok_or_else(unauthenticated)?;
    let Some(user) = User::find_by_id(&state.db, session_user.id).await? else {
        warn!(user_id = session_user.id, "session bound to missing user");
        return Err(unauthenticated());
    };

    Ok(UserProfile {
        created_at: parse_timestamp(&user.created_at),
        last_login: user.last_login.as_deref().and_then(parse_timestamp),
        username: user.username,
        email: user.email,
    })
}
