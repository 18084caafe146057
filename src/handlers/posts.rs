use axum::{
    extract::{Form, Path, State, rejection::FormRejection, rejection::PathRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::{debug, info};

use crate::LogbookError;
use crate::forms::{FieldErrors, NewPostForm, csrf};
use crate::middleware::{CurrentUser, RequireUser};
use crate::router::LogbookState;
use crate::views::{Chrome, NewPostPage, PostPage, PostsPage, render, set_flash, take_flash};

/// GET / -> every post, oldest first.
pub async fn list_posts(
    State(state): State<LogbookState>,
    CurrentUser(viewer): CurrentUser,
    jar: PrivateCookieJar,
) -> Result<Response, LogbookError> {
    let posts = state.storage.list_posts().await?;
    let (jar, flash) = take_flash(jar);
    let page = PostsPage {
        chrome: Chrome::new(viewer.as_ref(), flash),
        posts,
    };
    Ok((jar, render(&page)?).into_response())
}

/// GET /log/{id}
pub async fn view_post(
    State(state): State<LogbookState>,
    CurrentUser(viewer): CurrentUser,
    jar: PrivateCookieJar,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, LogbookError> {
    let Path(id) = id.map_err(|e| LogbookError::BadRequest(e.body_text()))?;
    let Some(post) = state.storage.get_post(id).await? else {
        debug!(post_id = id, "post not found");
        return Err(LogbookError::NotFound);
    };
    let (jar, flash) = take_flash(jar);
    let page = PostPage {
        chrome: Chrome::new(viewer.as_ref(), flash),
        post,
    };
    Ok((jar, render(&page)?).into_response())
}

/// GET /new/log
pub async fn new_post_form(
    State(state): State<LogbookState>,
    RequireUser(user): RequireUser,
    jar: PrivateCookieJar,
) -> Result<Response, LogbookError> {
    render_new_post(&state, &user, jar, NewPostForm::default(), FieldErrors::default())
}

/// POST /new/log -> store the post under the signed-in username.
pub async fn create_post(
    State(state): State<LogbookState>,
    RequireUser(user): RequireUser,
    jar: PrivateCookieJar,
    form: Result<Form<NewPostForm>, FormRejection>,
) -> Result<Response, LogbookError> {
    let Form(form) = form.map_err(|e| LogbookError::BadRequest(e.body_text()))?;

    let checked = FieldErrors::merge(csrf::check(&jar, &form.csrf_token), form.validate());
    let new_post = match checked {
        Ok(p) => p,
        Err(errors) => return render_new_post(&state, &user, jar, form, errors),
    };

    let post = state
        .storage
        .create_post(&new_post.title, &new_post.content, &user.username)
        .await?;
    info!(post_id = post.id, author = %post.author, "log created");

    let jar = set_flash(
        jar,
        "The log was created successfully.",
        state.secure_cookies(),
    );
    Ok((jar, Redirect::to("/")).into_response())
}

/// Fallback for unmatched routes and methods.
pub async fn not_found() -> LogbookError {
    LogbookError::NotFound
}

fn render_new_post(
    state: &LogbookState,
    user: &crate::db::User,
    jar: PrivateCookieJar,
    form: NewPostForm,
    errors: FieldErrors,
) -> Result<Response, LogbookError> {
    let (jar, csrf_token) = csrf::issue(jar, state.secure_cookies());
    let (jar, flash) = take_flash(jar);
    let page = NewPostPage {
        chrome: Chrome::new(Some(user), flash),
        csrf_token,
        title: form.title,
        content: form.content,
        errors,
    };
    Ok((jar, render(&page)?).into_response())
}
