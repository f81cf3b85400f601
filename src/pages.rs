//! Server-rendered HTML pages.

use axum::http::StatusCode;
use time::{macros::format_description, OffsetDateTime};

use crate::{
    auth::dto::{AuthStatus, UserProfile},
    session::{Flash, FlashLevel},
};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn level_class(level: FlashLevel) -> &'static str {
    match level {
        FlashLevel::Success => "success",
        FlashLevel::Info => "info",
        FlashLevel::Error => "error",
    }
}

fn format_ts(ts: Option<OffsetDateTime>) -> String {
    ts.and_then(|t| {
        t.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
            .ok()
    })
    .unwrap_or_else(|| "Never".to_string())
}

fn layout(title: &str, auth: &AuthStatus, flashes: &[Flash], body: &str) -> String {
    let nav = if auth.authenticated {
        format!(
            r#"<span>Signed in as <strong>{}</strong></span> <a href="/profile">Profile</a> <a href="/logout">Log out</a>"#,
            escape(&auth.username)
        )
    } else {
        r#"<a href="/login">Log in</a> <a href="/signup">Sign up</a>"#.to_string()
    };

    let notices: String = flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                level_class(f.level),
                escape(&f.message)
            )
        })
        .collect();

    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | Arcade Zone</title></head>
<body>
<nav><a href="/">Arcade Zone</a> {nav}</nav>
{notices}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn index_page(auth: &AuthStatus, flashes: &[Flash], games: &[String]) -> String {
    let greeting = if auth.authenticated {
        format!("<h1>Welcome back, {}!</h1>", escape(&auth.username))
    } else {
        "<h1>Welcome to Arcade Zone</h1>".to_string()
    };

    let list = if games.is_empty() {
        "<p>No games installed yet.</p>".to_string()
    } else {
        let items: String = games
            .iter()
            .map(|g| {
                let name = escape(g);
                format!(r#"<li><a href="/games/{name}">{name}</a></li>"#)
            })
            .collect();
        format!("<ul class=\"games\">{items}</ul>")
    };

    layout("Home", auth, flashes, &format!("{greeting}\n{list}"))
}

pub fn login_page(auth: &AuthStatus, flashes: &[Flash], username: &str) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
<form method="post" action="/login">
<label>Username or email <input name="username" value="{}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/signup">Sign up</a></p>"#,
        escape(username)
    );
    layout("Log in", auth, flashes, &body)
}

pub fn signup_page(auth: &AuthStatus, flashes: &[Flash], username: &str, email: &str) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
<form method="post" action="/signup">
<label>Username <input name="username" value="{}" required></label>
<label>Email <input type="email" name="email" value="{}" required></label>
<label>Password <input type="password" name="password" minlength="6" required></label>
<label>Confirm password <input type="password" name="confirm_password" minlength="6" required></label>
<button type="submit">Create account</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        escape(username),
        escape(email)
    );
    layout("Sign up", auth, flashes, &body)
}

pub fn profile_page(auth: &AuthStatus, flashes: &[Flash], profile: &UserProfile) -> String {
    let body = format!(
        r#"<h1>Profile</h1>
<dl>
<dt>Username</dt><dd>{}</dd>
<dt>Email</dt><dd>{}</dd>
<dt>Member since</dt><dd>{}</dd>
<dt>Last login</dt><dd>{}</dd>
</dl>"#,
        escape(&profile.username),
        escape(&profile.email),
        format_ts(profile.created_at),
        format_ts(profile.last_login),
    );
    layout("Profile", auth, flashes, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let anonymous = AuthStatus {
        authenticated: false,
        username: String::new(),
    };
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>",
        status.as_u16(),
        escape(message)
    );
    layout("Error", &anonymous, &[], &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn index_shows_flashes_and_username() {
        let auth = AuthStatus {
            authenticated: true,
            username: "alice".into(),
        };
        let flashes = vec![Flash {
            level: FlashLevel::Success,
            message: "Login successful!".into(),
        }];
        let html = index_page(&auth, &flashes, &["snake.html".into()]);
        assert!(html.contains("Welcome back, alice!"));
        assert!(html.contains(r#"class="flash flash-success">Login successful!"#));
        assert!(html.contains(r#"href="/games/snake.html""#));
        assert!(html.contains("/logout"));
    }

    #[test]
    fn profile_renders_missing_timestamps_as_never() {
        let auth = AuthStatus {
            authenticated: true,
            username: "alice".into(),
        };
        let profile = UserProfile {
            username: "alice".into(),
            email: "a@x.com".into(),
            created_at: Some(datetime!(2024-06-01 12:00 UTC)),
            last_login: None,
        };
        let html = profile_page(&auth, &[], &profile);
        assert!(html.contains("2024-06-01 12:00 UTC"));
        assert!(html.contains("<dd>Never</dd>"));
    }
}
