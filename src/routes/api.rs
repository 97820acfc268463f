use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;

use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::forms::CommentForm;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle-like", post(toggle_like))
        .route("/toggle-follow", post(toggle_follow))
        .route("/add-comment", post(add_comment))
}

#[derive(Deserialize)]
pub struct ToggleLikeRequest {
    pub post_id: String,
}

#[derive(Deserialize)]
pub struct ToggleFollowRequest {
    pub username: String,
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub post_id: String,
    pub content: String,
}

/// POST /toggle-like — {post_id} → {liked, likes_count}
async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ToggleLikeRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let (liked, likes_count) = queries::toggle_like(&conn, &req.post_id, &user.id)?;
    Ok(Json(json!({
        "liked": liked,
        "likes_count": likes_count,
    })))
}

/// POST /toggle-follow — {username} → {following, followers_count,
/// following_count}, or {error} for a self-follow.
async fn toggle_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ToggleFollowRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let target = queries::find_user_by_username(&conn, &req.username)?.ok_or(AppError::NotFound)?;

    if target.id == user.id {
        return Ok(Json(json!({ "error": "You cannot follow yourself" })));
    }

    let (following, followers_count, following_count) =
        queries::toggle_follow(&conn, &user.id, &target.id)?;
    Ok(Json(json!({
        "following": following,
        "followers_count": followers_count,
        "following_count": following_count,
    })))
}

/// POST /add-comment — {post_id, content} → {success, comment_id, author,
/// content, created_at}
async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AddCommentRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let form = CommentForm {
        content: req.content,
    };
    if let Some(error) = form.validate().into_iter().next() {
        return Err(AppError::BadRequest(error));
    }

    let conn = state.db.get()?;
    let comment = queries::add_comment(&conn, &req.post_id, &user.id, form.content.trim())?;

    Ok(Json(json!({
        "success": true,
        "comment_id": comment.id,
        "author": comment.author,
        "content": comment.content,
        "created_at": display_timestamp(&comment.created_at),
    })))
}

/// SQLite's `datetime('now')` TEXT rendered the way the UI shows it,
/// e.g. "August 23, 2026 at 07:15 PM".
fn display_timestamp(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt.format("%B %d, %Y at %I:%M %p").to_string(),
        Err(_) => raw.to_string(),
    }
}
