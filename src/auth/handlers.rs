use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthStatus, LoginForm, SignupForm},
        extractors::{with_cookie, CurrentSession},
        services::{self, Registration},
    },
    error::AppError,
    games::list_games,
    pages,
    session::{session_cookie, Flash, FlashLevel, Session},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/signup", get(signup_form).post(signup))
        .route("/logout", get(logout))
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/profile", get(profile))
        .route("/api/check-auth", get(check_auth))
}

fn error_notice(err: &AppError) -> Vec<Flash> {
    vec![Flash {
        level: FlashLevel::Error,
        message: err.notice(),
    }]
}

/// Renders a page after consuming the session's pending flash notices.
async fn render_with_flashes(
    state: &AppState,
    mut session: CurrentSession,
    render: impl FnOnce(&AuthStatus, &[Flash]) -> String,
) -> Result<Response, AppError> {
    let flashes = session.data.take_flashes();
    let auth = services::check_auth(&session.data);
    let html = render(&auth, &flashes);
    if !flashes.is_empty() {
        session.commit(state).await?;
    }
    Ok(Html(html).into_response())
}

/// Replaces the current session with `fresh`, queues `notice` on it and
/// redirects home with the new cookie.
async fn switch_session(
    state: &AppState,
    old: Option<String>,
    mut fresh: Session,
    notice: &str,
) -> Result<Response, AppError> {
    services::logout(state, old.as_deref()).await?;
    fresh.data.flash(FlashLevel::Success, notice);
    state.sessions.set(&fresh.token, fresh.data).await?;
    let cookie = session_cookie(&state.config.session, &fresh.token)?;
    Ok(with_cookie(Some(cookie), Redirect::to("/")))
}

#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    let games = list_games(&state.config.games_dir).await;
    render_with_flashes(&state, session, |auth, flashes| {
        pages::index_page(auth, flashes, &games)
    })
    .await
}

#[instrument(skip(state, session))]
pub async fn login_form(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    render_with_flashes(&state, session, |auth, flashes| {
        pages::login_page(auth, flashes, "")
    })
    .await
}

#[instrument(skip(state, session, form), fields(login = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match services::login(&state, &form.username, &form.password).await {
        Ok(fresh) => switch_session(&state, session.token, fresh, "Login successful!").await,
        Err(err) => {
            let auth = services::check_auth(&session.data);
            let html = pages::login_page(&auth, &error_notice(&err), &form.username);
            Ok((err.status(), Html(html)).into_response())
        }
    }
}

#[instrument(skip(state, session))]
pub async fn signup_form(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    render_with_flashes(&state, session, |auth, flashes| {
        pages::signup_page(auth, flashes, "", "")
    })
    .await
}

#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let reg = Registration {
        username: &form.username,
        email: &form.email,
        password: &form.password,
        confirm_password: &form.confirm_password,
    };
    match services::register(&state, reg).await {
        Ok((fresh, _user)) => {
            switch_session(&state, session.token, fresh, "Account created successfully!").await
        }
        Err(err) => {
            let auth = services::check_auth(&session.data);
            let html =
                pages::signup_page(&auth, &error_notice(&err), &form.username, &form.email);
            Ok((err.status(), Html(html)).into_response())
        }
    }
}

#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    services::logout(&state, session.token.as_deref()).await?;

    let mut anonymous = CurrentSession {
        token: None,
        data: Default::default(),
    };
    anonymous.flash(FlashLevel::Info, "You have been logged out.");
    anonymous.redirect(&state, "/").await
}

#[instrument(skip(state, session))]
pub async fn profile(
    State(state): State<AppState>,
    mut session: CurrentSession,
) -> Result<Response, AppError> {
    let result = services::get_profile(&state, &session.data).await;
    match result {
        Ok(profile) => render_with_flashes(&state, session, |auth, flashes| {
            pages::profile_page(auth, flashes, &profile)
        })
        .await,
        Err(err @ AppError::Authentication(_)) => {
            session.flash(FlashLevel::Error, err.notice());
            session.redirect(&state, "/login").await
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip(session))]
pub async fn check_auth(session: CurrentSession) -> Json<AuthStatus> {
    Json(services::check_auth(&session.data))
}
