use std::path::Path;

use axum::{
    extract::State,
    handler::Handler,
    http::Uri,
    response::Response,
    Router,
};
use tower_http::services::ServeDir;
use tracing::{instrument, warn};

use crate::{auth::extractors::CurrentSession, error::AppError, session::FlashLevel, state::AppState};

/// `/games/*` backed by the games directory. Anything `ServeDir` cannot
/// resolve (missing file, path escaping the directory) falls through to
/// [`game_not_found`].
pub fn router(state: AppState) -> Router<AppState> {
    let serve = ServeDir::new(&state.config.games_dir)
        .append_index_html_on_directories(true)
        .fallback(game_not_found.with_state(state));
    Router::new().nest_service("/games", serve)
}

#[instrument(skip(state, session))]
async fn game_not_found(
    State(state): State<AppState>,
    uri: Uri,
    mut session: CurrentSession,
) -> Result<Response, AppError> {
    let err = AppError::NotFound("Game not found".into());
    warn!(path = %uri.path(), "game not found");
    session.flash(FlashLevel::Error, err.notice());
    session.redirect(&state, "/").await
}

/// Playable entries at the top level of `dir`: `*.html` files and
/// directories with an `index.html`. Sorted; empty if `dir` is unreadable.
pub async fn list_games(dir: &Path) -> Vec<String> {
    let mut games = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, dir = %dir.display(), "cannot read games directory");
            return games;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if file_type.is_dir() {
            if tokio::fs::try_exists(path.join("index.html")).await.unwrap_or(false) {
                games.push(format!("{name}/"));
            }
        } else if path.extension().is_some_and(|ext| ext == "html") {
            games.push(name);
        }
    }

    games.sort();
    games
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{header, Request, StatusCode}};
    use tower::ServiceExt;

    fn games_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snake.html"), "<h1>snake</h1>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a game").unwrap();
        std::fs::create_dir(dir.path().join("tetris")).unwrap();
        std::fs::write(dir.path().join("tetris/index.html"), "<h1>tetris</h1>").unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    #[tokio::test]
    async fn lists_html_files_and_game_directories() {
        let dir = games_dir();
        assert_eq!(list_games(dir.path()).await, vec!["snake.html", "tetris/"]);
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        assert!(list_games(Path::new("/definitely/not/here")).await.is_empty());
    }

    #[tokio::test]
    async fn serves_existing_game_file() {
        let dir = games_dir();
        let state = AppState::fake(dir.path()).await;
        let app = router(state.clone()).with_state(state);

        let res = app
            .oneshot(Request::get("/games/snake.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>snake</h1>");
    }

    #[tokio::test]
    async fn missing_game_redirects_home_with_flash() {
        let dir = games_dir();
        let state = AppState::fake(dir.path()).await;
        let app = router(state.clone()).with_state(state.clone());

        let res = app
            .oneshot(Request::get("/games/pacman.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");

        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        let token = cookie
            .strip_prefix("arcade_session=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let data = state.sessions.get(token).await.unwrap().unwrap();
        assert_eq!(data.flashes[0].message, "Game not found");
        assert!(data.user.is_none());
    }

    #[tokio::test]
    async fn traversal_is_treated_as_missing() {
        let dir = games_dir();
        let state = AppState::fake(dir.path()).await;
        let app = router(state.clone()).with_state(state);

        let res = app
            .oneshot(Request::get("/games/../Cargo.toml").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }
}
