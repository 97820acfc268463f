use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{self, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use crate::db::queries::{self, PostView};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::flash;
use crate::forms::ProfileForm;
use crate::routes::home::{Html, PageQuery};
use crate::state::AppState;
use crate::uploads;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{username}", get(profile_page))
        .route(
            "/edit-profile",
            get(edit_profile_page).post(edit_profile_submit),
        )
}

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub avatar_path: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
    pub is_self: bool,
    pub posts: Vec<PostView>,
    pub page: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Template)]
#[template(path = "pages/edit_profile.html")]
pub struct EditProfileTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub errors: Vec<String>,
    pub form: ProfileForm,
    pub avatar_path: Option<String>,
}

/// GET /profile/{username} — profile header plus that user's posts.
async fn profile_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let profile_user = queries::find_user_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
    let profile = queries::profile_for_user(&conn, &profile_user.id)?;

    let is_self = profile_user.id == user.id;
    let is_following = if is_self {
        false
    } else {
        queries::is_following(&conn, &user.id, &profile_user.id)?
    };

    let page = queries::author_posts_page(
        &conn,
        &profile_user.id,
        Some(&user.id),
        query.page.unwrap_or(1),
    )?;

    let flash_message = flash::take(&headers);
    let template = ProfileTemplate {
        viewer: Some(user.username),
        flash: flash_message.clone(),
        username: profile_user.username,
        first_name: profile_user.first_name,
        last_name: profile_user.last_name,
        bio: profile.bio,
        avatar_path: profile.avatar_path,
        followers_count: queries::follower_count(&conn, &profile_user.id)?,
        following_count: queries::following_count(&conn, &profile_user.id)?,
        is_following,
        is_self,
        has_prev: page.has_prev(),
        has_next: page.has_next(),
        posts: page.items,
        page: page.page,
        total_pages: page.total_pages,
    };

    if flash_message.is_some() {
        Ok((
            AppendHeaders([(header::SET_COOKIE, flash::clear_cookie())]),
            Html(template),
        )
            .into_response())
    } else {
        Ok(Html(template).into_response())
    }
}

/// GET /edit-profile — combined user + profile form, prefilled.
async fn edit_profile_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let record = queries::find_user_by_username(&conn, &user.username)?.ok_or(AppError::NotFound)?;
    let profile = queries::profile_for_user(&conn, &user.id)?;

    Ok(Html(EditProfileTemplate {
        viewer: Some(user.username),
        flash: None,
        errors: Vec::new(),
        form: ProfileForm {
            username: record.username,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            bio: profile.bio,
        },
        avatar_path: profile.avatar_path,
    })
    .into_response())
}

/// POST /edit-profile — multipart because of the avatar upload.
async fn edit_profile_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let (texts, mut files) = super::collect_multipart(multipart).await?;
    let form = ProfileForm {
        username: texts.get("username").cloned().unwrap_or_default(),
        email: texts.get("email").cloned().unwrap_or_default(),
        first_name: texts.get("first_name").cloned().unwrap_or_default(),
        last_name: texts.get("last_name").cloned().unwrap_or_default(),
        bio: texts.get("bio").cloned().unwrap_or_default(),
    };

    let mut errors = form.validate();
    let new_username = form.username.trim().to_string();

    {
        let conn = state.db.get()?;
        if errors.is_empty()
            && new_username != user.username
            && queries::username_taken(&conn, &new_username)?
        {
            errors.push("That username is already taken.".into());
        }
    }

    let mut avatar_path = None;
    if errors.is_empty() {
        if let Some(file) = files.remove("avatar") {
            match uploads::save_image(
                state.config.uploads_path(),
                "profile_pics",
                &file.filename,
                &file.data,
            ) {
                Ok(path) => avatar_path = Some(path),
                Err(AppError::BadRequest(msg)) => errors.push(msg),
                Err(e) => return Err(e),
            }
        }
    }

    if !errors.is_empty() {
        let conn = state.db.get()?;
        let profile = queries::profile_for_user(&conn, &user.id)?;
        return Ok(Html(EditProfileTemplate {
            viewer: Some(user.username),
            flash: None,
            errors,
            form,
            avatar_path: profile.avatar_path,
        })
        .into_response());
    }

    {
        let mut conn = state.db.get()?;
        queries::update_user_and_profile(
            &mut conn,
            &user.id,
            &new_username,
            form.email.trim(),
            form.first_name.trim(),
            form.last_name.trim(),
            form.bio.trim(),
            avatar_path.as_deref(),
        )?;
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, flash::set_cookie("profile_updated"))]),
        Redirect::to(&format!("/profile/{}", new_username)),
    )
        .into_response())
}
