use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::db::queries::{self, UserSummary};
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search_users))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub query: String,
    pub users: Vec<UserSummary>,
}

/// GET /search?q= — substring match on username or real name, excluding
/// the requester.
async fn search_users(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(params): Query<SearchQuery>,
) -> AppResult<Response> {
    let query = params.q.unwrap_or_default();

    let users = if query.trim().is_empty() {
        Vec::new()
    } else {
        let conn = state.db.get()?;
        queries::search_users(
            &conn,
            query.trim(),
            maybe_user.0.as_ref().map(|u| u.id.as_str()),
        )?
    };

    Ok(Html(SearchTemplate {
        viewer: maybe_user.0.map(|u| u.username),
        flash: None,
        query,
        users,
    })
    .into_response())
}
