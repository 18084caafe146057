use axum::{
    extract::{Form, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::{info, warn};

use crate::LogbookError;
use crate::auth::password;
use crate::db::User;
use crate::forms::{FieldErrors, SigninForm, SignupForm, csrf};
use crate::middleware::{CurrentUser, RequireUser};
use crate::router::LogbookState;
use crate::views::{Chrome, SigninPage, SignupPage, render, set_flash, take_flash};

/// GET /signup
pub async fn signup_form(
    State(state): State<LogbookState>,
    CurrentUser(viewer): CurrentUser,
    jar: PrivateCookieJar,
) -> Result<Response, LogbookError> {
    render_signup(
        &state,
        viewer.as_ref(),
        jar,
        SignupForm::default(),
        FieldErrors::default(),
    )
}

/// POST /signup -> create the account, then send the browser to sign-in.
pub async fn signup(
    State(state): State<LogbookState>,
    CurrentUser(viewer): CurrentUser,
    jar: PrivateCookieJar,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Result<Response, LogbookError> {
    let Form(form) = form.map_err(|e| LogbookError::BadRequest(e.body_text()))?;

    let checked = FieldErrors::merge(csrf::check(&jar, &form.csrf_token), form.validate());
    let new_user = match checked {
        Ok(u) => u,
        Err(errors) => return render_signup(&state, viewer.as_ref(), jar, form, errors),
    };

    // Friendly early answers; the UNIQUE constraints below still decide races.
    if state
        .storage
        .find_user_by_username(&new_user.username)
        .await?
        .is_some()
    {
        return Err(LogbookError::DuplicateUsername);
    }
    if state
        .storage
        .find_user_by_email(&new_user.email)
        .await?
        .is_some()
    {
        return Err(LogbookError::DuplicateEmail);
    }

    let hashed = password::hash(&new_user.password)?;
    let user = state
        .storage
        .create_user(&new_user.username, &new_user.email, &hashed)
        .await?;
    info!(user_id = user.id, username = %user.username, "user registered");

    let jar = set_flash(
        jar,
        "You've been registered successfully",
        state.secure_cookies(),
    );
    Ok((jar, Redirect::to("/signin")).into_response())
}

/// GET /signin
pub async fn signin_form(
    State(state): State<LogbookState>,
    CurrentUser(viewer): CurrentUser,
    jar: PrivateCookieJar,
) -> Result<Response, LogbookError> {
    render_signin(
        &state,
        viewer.as_ref(),
        jar,
        SigninForm::default(),
        FieldErrors::default(),
    )
}

/// POST /signin -> start a session and continue to the new-post form.
pub async fn signin(
    State(state): State<LogbookState>,
    CurrentUser(viewer): CurrentUser,
    jar: PrivateCookieJar,
    form: Result<Form<SigninForm>, FormRejection>,
) -> Result<Response, LogbookError> {
    let Form(form) = form.map_err(|e| LogbookError::BadRequest(e.body_text()))?;

    let checked = FieldErrors::merge(csrf::check(&jar, &form.csrf_token), form.validate());
    let login = match checked {
        Ok(l) => l,
        Err(errors) => return render_signin(&state, viewer.as_ref(), jar, form, errors),
    };

    let user = state.storage.find_user_by_email(&login.email).await?;
    let Some(user) = user.filter(|u| password::verify(&login.password, &u.password)) else {
        warn!("sign-in rejected: invalid credentials");
        return Err(LogbookError::InvalidCredentials);
    };

    let jar = state
        .sessions
        .authenticate(jar, user.id, login.remember)
        .await?;
    info!(user_id = user.id, "user signed in");
    Ok((jar, Redirect::to("/new/log")).into_response())
}

/// GET /logout
pub async fn logout(
    State(state): State<LogbookState>,
    RequireUser(user): RequireUser,
    jar: PrivateCookieJar,
) -> Result<Response, LogbookError> {
    let jar = state.sessions.end_session(jar).await?;
    info!(user_id = user.id, "user signed out");
    let jar = set_flash(jar, "You've logged out correctly.", state.secure_cookies());
    Ok((jar, Redirect::to("/")).into_response())
}

fn render_signup(
    state: &LogbookState,
    viewer: Option<&User>,
    jar: PrivateCookieJar,
    form: SignupForm,
    errors: FieldErrors,
) -> Result<Response, LogbookError> {
    let (jar, csrf_token) = csrf::issue(jar, state.secure_cookies());
    let (jar, flash) = take_flash(jar);
    let page = SignupPage {
        chrome: Chrome::new(viewer, flash),
        csrf_token,
        username: form.username,
        email: form.email,
        errors,
    };
    Ok((jar, render(&page)?).into_response())
}

fn render_signin(
    state: &LogbookState,
    viewer: Option<&User>,
    jar: PrivateCookieJar,
    form: SigninForm,
    errors: FieldErrors,
) -> Result<Response, LogbookError> {
    let (jar, csrf_token) = csrf::issue(jar, state.secure_cookies());
    let (jar, flash) = take_flash(jar);
    let remember = form.remember();
    let page = SigninPage {
        chrome: Chrome::new(viewer, flash),
        csrf_token,
        email: form.email,
        remember,
        errors,
    };
    Ok((jar, render(&page)?).into_response())
}
