use askama::Template;
use axum::extract::{Query, State};
use axum::http::header::{self, HeaderMap};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use serde::Deserialize;

use crate::db::queries::{self, PostView};
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::flash;
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub viewer: Option<String>,
    pub flash: Option<String>,
    pub posts: Vec<PostView>,
    pub page: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

/// GET / — the feed. Posts from followed authors when signed in and
/// following anyone, the global firehose otherwise.
pub async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let viewer_id = maybe_user.0.as_ref().map(|u| u.id.as_str());
    let page = queries::feed_page(&conn, viewer_id, query.page.unwrap_or(1))?;

    let flash_message = flash::take(&headers);
    let template = HomeTemplate {
        viewer: maybe_user.0.map(|u| u.username),
        flash: flash_message.clone(),
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
