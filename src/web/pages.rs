// Server-rendered pages: landing, login, registration, the board and logout.
//
// Form handlers always answer with a redirect; outcome messages travel in the
// flash cookie and are shown once on the next page.

use super::api::display_time;
use super::{flash, session, AppState};
use crate::core::accounts::{AccountError, Registration};
use crate::core::board::PostWithComments;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, flash: Option<String>, body: &str) -> Html<String> {
    let flash = flash
        .map(|m| format!("<p class=\"flash\">{}</p>", escape(&m)))
        .unwrap_or_default();

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} | Campus Board</title></head>\n<body>\n{flash}\n{body}\n</body>\n</html>\n",
        title = escape(title),
    ))
}

fn redirect_with(jar: CookieJar, message: &str, to: &str) -> Response {
    (flash::set(jar, message), Redirect::to(to)).into_response()
}

pub async fn home(jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, message) = flash::take(jar);
    let body = "<h1>Campus Board</h1>\n\
        <p>Share news, questions and events with your campus.</p>\n\
        <p><a href=\"/login\">Log in</a> or <a href=\"/register\">create an account</a>.</p>";
    (jar, layout("Welcome", message, body))
}

pub async fn login_page(jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, message) = flash::take(jar);
    let body = "<h1>Log in</h1>\n\
        <form method=\"post\" action=\"/login\">\n\
        <input name=\"username\" placeholder=\"Username\">\n\
        <input name=\"password\" type=\"password\" placeholder=\"Password\">\n\
        <button type=\"submit\">Log in</button>\n\
        </form>\n\
        <p>No account yet? <a href=\"/register\">Register</a></p>";
    (jar, layout("Log in", message, body))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.accounts.login(&form.username, &form.password).await {
        Ok(session) => {
            let jar = jar.add(session::session_cookie(session.token, state.cookie_secure));
            redirect_with(jar, "Login successful!", "/index")
        }
        Err(AccountError::UnknownUser) => {
            redirect_with(jar, "User not found. Please register first.", "/register")
        }
        Err(AccountError::WrongPassword) => {
            redirect_with(jar, "Incorrect password. Try again.", "/login")
        }
        Err(AccountError::Validation(message)) => redirect_with(jar, &message, "/login"),
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            redirect_with(jar, "Something went wrong. Please try again.", "/login")
        }
    }
}

pub async fn register_page(jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, message) = flash::take(jar);
    let body = "<h1>Register</h1>\n\
        <form method=\"post\" action=\"/register\">\n\
        <input name=\"username\" placeholder=\"Username\">\n\
        <input name=\"email\" type=\"email\" placeholder=\"Email\">\n\
        <input name=\"password\" type=\"password\" placeholder=\"Password\">\n\
        <input name=\"confirm_password\" type=\"password\" placeholder=\"Confirm password\">\n\
        <button type=\"submit\">Register</button>\n\
        </form>\n\
        <p>Already registered? <a href=\"/login\">Log in</a></p>";
    (jar, layout("Register", message, body))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = Registration {
        username: form.username,
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match state.accounts.register(&registration).await {
        Ok(_) => redirect_with(jar, "Registration successful! Please log in.", "/login"),
        Err(AccountError::PasswordMismatch) => {
            redirect_with(jar, "Passwords do not match!", "/register")
        }
        Err(AccountError::DuplicateAccount) => {
            redirect_with(jar, "Username or email already exists!", "/register")
        }
        Err(AccountError::Validation(message)) => redirect_with(jar, &message, "/register"),
        Err(e) => {
            tracing::error!("Registration failed: {}", e);
            redirect_with(jar, "Something went wrong. Please try again.", "/register")
        }
    }
}

fn render_feed(feed: &[PostWithComments]) -> String {
    if feed.is_empty() {
        return "<p>No posts yet.</p>".to_string();
    }

    let mut html = String::from("<ul class=\"feed\">\n");
    for item in feed {
        let post = &item.post;
        html.push_str(&format!(
            "<li><h3>{}</h3><p>{}</p><small>{} | {} | {} likes</small>",
            escape(&post.title),
            escape(&post.message),
            escape(&post.category),
            display_time(post.created_at),
            post.likes,
        ));
        if !item.comments.is_empty() {
            html.push_str("<ul class=\"comments\">");
            for comment in &item.comments {
                html.push_str(&format!(
                    "<li><b>{}</b>: {}</li>",
                    escape(&comment.username),
                    escape(&comment.text)
                ));
            }
            html.push_str("</ul>");
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>");
    html
}

/// The board itself. Only for logged-in users.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let session = match session::current_session(&state, &jar).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Session lookup failed: {}", e);
            None
        }
    };
    let Some(session) = session else {
        return redirect_with(jar, "Please log in first.", "/login");
    };

    let feed = match state.board.recent_posts().await {
        Ok(feed) => render_feed(&feed),
        Err(e) => {
            tracing::error!("Failed to load feed: {}", e);
            "<p>Posts are unavailable right now.</p>".to_string()
        }
    };

    let (jar, message) = flash::take(jar);
    let body = format!(
        "<h1>Hello, {}</h1>\n<p><a href=\"/logout\">Log out</a></p>\n{}",
        escape(&session.username),
        feed
    );
    (jar, layout("Board", message, &body)).into_response()
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(token) = session::session_token(&jar) {
        if let Err(e) = state.accounts.logout(&token).await {
            tracing::warn!("Failed to drop session on logout: {}", e);
        }
    }

    let jar = session::clear_session(jar);
    redirect_with(jar, "You have been logged out successfully.", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_layout_escapes_flash() {
        let Html(page) = layout("Log in", Some("<b>hi</b>".to_string()), "");
        assert!(page.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(!page.contains("<b>hi</b>"));
    }
}
