use askama::Template;
use axum::extract::State;
use axum::http::header::{self, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::{password, session};
use crate::db::queries;
use crate::error::AppResult;
use crate::extractors::{extract_session_token, MaybeUser};
use crate::flash;
use crate::forms::{LoginForm, RegisterForm};
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub errors: Vec<String>,
    pub form: RegisterForm,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub errors: Vec<String>,
    pub username: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

// -- Registration --

/// GET /register — render the registration form (signed-in users go home)
pub async fn register_page(maybe_user: MaybeUser) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(Html(RegisterTemplate {
        viewer: None,
        flash: None,
        errors: Vec::new(),
        form: RegisterForm::default(),
    })
    .into_response())
}

/// POST /register — create user + profile in one transaction, sign in
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let mut errors = form.validate();

    if errors.is_empty() {
        let conn = state.db.get()?;
        if queries::username_taken(&conn, form.username.trim())? {
            errors.push("That username is already taken.".into());
        }
    }

    if !errors.is_empty() {
        return Ok(Html(RegisterTemplate {
            viewer: None,
            flash: None,
            errors,
            form,
        })
        .into_response());
    }

    let password_hash = password::hash(&form.password)?;
    let user_id = {
        let mut conn = state.db.get()?;
        queries::create_user_with_profile(
            &mut conn,
            form.username.trim(),
            form.email.trim(),
            form.first_name.trim(),
            form.last_name.trim(),
            &password_hash,
        )?
    };
    tracing::info!("Registered new user {}", form.username.trim());

    let token = session::create_session(&state.db, &user_id, state.config.auth.session_hours)?;
    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                session_cookie(
                    &state.config.auth.cookie_name,
                    &token,
                    state.config.auth.session_hours,
                ),
            ),
            (header::SET_COOKIE, flash::set_cookie("account_created")),
        ]),
        Redirect::to("/"),
    )
        .into_response())
}

// -- Login / logout --

/// GET /login
pub async fn login_page(maybe_user: MaybeUser) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(Html(LoginTemplate {
        viewer: None,
        flash: None,
        errors: Vec::new(),
        username: String::new(),
    })
    .into_response())
}

/// POST /login — verify credentials, start a session
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let mut errors = form.validate();

    let mut user_id = None;
    if errors.is_empty() {
        let conn = state.db.get()?;
        match queries::find_user_by_username(&conn, form.username.trim())? {
            Some(user) if password::verify(&form.password, &user.password_hash) => {
                user_id = Some(user.id);
            }
            // Same message either way; don't leak which usernames exist
            _ => errors.push("Invalid username or password.".into()),
        }
    }

    let Some(user_id) = user_id else {
        return Ok(Html(LoginTemplate {
            viewer: None,
            flash: None,
            errors,
            username: form.username,
        })
        .into_response());
    };

    let token = session::create_session(&state.db, &user_id, state.config.auth.session_hours)?;
    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(
                &state.config.auth.cookie_name,
                &token,
                state.config.auth.session_hours,
            ),
        )]),
        Redirect::to("/"),
    )
        .into_response())
}

/// GET/POST /logout — drop the session row and clear the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = extract_session_token(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, token)?;
    }
    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            clear_session_cookie(&state.config.auth.cookie_name),
        )]),
        Redirect::to("/login"),
    )
        .into_response())
}
