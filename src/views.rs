//! Server-rendered pages and one-shot flash messages.

use askama::Template;
use axum::response::Html;
use axum_extra::extract::cookie::PrivateCookieJar;

use crate::auth::{build_cookie, clear_cookie};
use crate::db::{Post, User};
use crate::error::LogbookError;
use crate::forms::FieldErrors;

pub const FLASH_COOKIE: &str = "logbook_flash";

/// Per-page data shown by the shared layout.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    /// Username of the signed-in visitor.
    pub viewer: Option<String>,
    pub flash: Option<String>,
}

impl Chrome {
    pub fn new(viewer: Option<&User>, flash: Option<String>) -> Self {
        Self {
            viewer: viewer.map(|u| u.username.clone()),
            flash,
        }
    }
}

#[derive(Template)]
#[template(path = "posts.html")]
pub struct PostsPage {
    pub chrome: Chrome,
    pub posts: Vec<Post>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostPage {
    pub chrome: Chrome,
    pub post: Post,
}

#[derive(Template)]
#[template(path = "new_post.html")]
pub struct NewPostPage {
    pub chrome: Chrome,
    pub csrf_token: String,
    pub title: String,
    pub content: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub chrome: Chrome,
    pub csrf_token: String,
    pub username: String,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "signin.html")]
pub struct SigninPage {
    pub chrome: Chrome,
    pub csrf_token: String,
    pub email: String,
    pub remember: bool,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub chrome: Chrome,
    pub heading: &'static str,
    pub message: &'static str,
}

impl ErrorPage {
    pub fn not_found() -> Self {
        Self {
            chrome: Chrome::default(),
            heading: "Page not found",
            message: "The page you are looking for does not exist.",
        }
    }

    pub fn internal() -> Self {
        Self {
            chrome: Chrome::default(),
            heading: "Something went wrong",
            message: "An internal server error occurred. Please try again later.",
        }
    }
}

pub fn render<T: Template>(page: &T) -> Result<Html<String>, LogbookError> {
    Ok(Html(page.render()?))
}

/// Queue a message for the next rendered page.
pub fn set_flash(jar: PrivateCookieJar, message: &str, secure: bool) -> PrivateCookieJar {
    jar.add(build_cookie(FLASH_COOKIE, message.to_string(), secure, None))
}

/// Pop the pending flash message, if any.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE).map(|c| c.value().to_owned()) {
        Some(message) => (jar.remove(clear_cookie(FLASH_COOKIE)), Some(message)),
        None => (jar, None),
    }
}
