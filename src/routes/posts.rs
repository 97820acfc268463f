use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::http::header::{self, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::db::queries::{self, CommentView, PostView};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash;
use crate::forms::{CommentForm, PostForm};
use crate::routes::home::Html;
use crate::state::AppState;
use crate::uploads;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/create-post",
            get(create_post_page).post(create_post_submit),
        )
        .route("/post/{id}", get(post_detail).post(post_detail_comment))
        .route("/delete-post/{id}", post(delete_post))
        .route("/delete-comment/{id}", post(delete_comment))
}

#[derive(Template)]
#[template(path = "pages/create_post.html")]
pub struct CreatePostTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub errors: Vec<String>,
    pub content: String,
}

#[derive(Template)]
#[template(path = "pages/post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub viewer_id: Option<String>,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub comment_errors: Vec<String>,
    pub comment_content: String,
}

/// GET /create-post
async fn create_post_page(user: CurrentUser) -> AppResult<Response> {
    Ok(Html(CreatePostTemplate {
        viewer: Some(user.username),
        flash: None,
        errors: Vec::new(),
        content: String::new(),
    })
    .into_response())
}

/// POST /create-post — content plus optional image, multipart.
async fn create_post_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let (texts, mut files) = super::collect_multipart(multipart).await?;
    let form = PostForm {
        content: texts.get("content").cloned().unwrap_or_default(),
    };

    let mut errors = form.validate();

    let mut image_path = None;
    if errors.is_empty() {
        if let Some(file) = files.remove("image") {
            match uploads::save_image(
                state.config.uploads_path(),
                "post_images",
                &file.filename,
                &file.data,
            ) {
                Ok(path) => image_path = Some(path),
                Err(AppError::BadRequest(msg)) => errors.push(msg),
                Err(e) => return Err(e),
            }
        }
    }

    if !errors.is_empty() {
        return Ok(Html(CreatePostTemplate {
            viewer: Some(user.username),
            flash: None,
            errors,
            content: form.content,
        })
        .into_response());
    }

    let conn = state.db.get()?;
    queries::create_post(&conn, &user.id, form.content.trim(), image_path.as_deref())?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, flash::set_cookie("post_created"))]),
        Redirect::to("/"),
    )
        .into_response())
}

/// GET /post/{id} — post with comments oldest-first and a comment form.
async fn post_detail(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let viewer_id = maybe_user.0.as_ref().map(|u| u.id.as_str());
    let post = queries::get_post(&conn, &id, viewer_id)?;
    let comments = queries::post_comments(&conn, &id)?;

    let flash_message = flash::take(&headers);
    let template = PostDetailTemplate {
        viewer: maybe_user.0.as_ref().map(|u| u.username.clone()),
        flash: flash_message.clone(),
        viewer_id: maybe_user.0.map(|u| u.id),
        post,
        comments,
        comment_errors: Vec::new(),
        comment_content: String::new(),
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

/// POST /post/{id} — comment form on the detail page.
async fn post_detail_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let errors = form.validate();
    if !errors.is_empty() {
        let conn = state.db.get()?;
        let post = queries::get_post(&conn, &id, Some(&user.id))?;
        let comments = queries::post_comments(&conn, &id)?;
        return Ok(Html(PostDetailTemplate {
            viewer: Some(user.username),
            flash: None,
            viewer_id: Some(user.id),
            post,
            comments,
            comment_errors: errors,
            comment_content: form.content,
        })
        .into_response());
    }

    let conn = state.db.get()?;
    queries::add_comment(&conn, &id, &user.id, form.content.trim())?;
    Ok(Redirect::to(&format!("/post/{}", id)).into_response())
}

/// POST /delete-post/{id} — author-only; cascades to comments and likes.
async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let deleted = queries::delete_post(&conn, &id, &user.id)?;

    let code = if deleted { "post_deleted" } else { "not_your_post" };
    Ok((
        AppendHeaders([(header::SET_COOKIE, flash::set_cookie(code))]),
        Redirect::to("/"),
    )
        .into_response())
}

/// POST /delete-comment/{id} — author-only; redirects to the owning post.
async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let (post_id, deleted) = queries::delete_comment(&conn, &id, &user.id)?;

    let code = if deleted {
        "comment_deleted"
    } else {
        "not_your_comment"
    };
    Ok((
        AppendHeaders([(header::SET_COOKIE, flash::set_cookie(code))]),
        Redirect::to(&format!("/post/{}", post_id)),
    )
        .into_response())
}
