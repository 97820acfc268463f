use axum::http::header::{HeaderMap, COOKIE};

pub const FLASH_COOKIE: &str = "ripple_flash";

/// One-shot notices carried across a redirect in a short-lived cookie.
/// Only known codes travel on the wire, so nothing needs escaping.
pub fn message(code: &str) -> Option<&'static str> {
    Some(match code {
        "account_created" => "Your account has been created. Welcome!",
        "post_created" => "Post created successfully!",
        "post_deleted" => "Post deleted successfully!",
        "comment_deleted" => "Comment deleted successfully!",
        "profile_updated" => "Your profile has been updated!",
        "not_your_post" => "You can only delete your own posts.",
        "not_your_comment" => "You can only delete your own comments.",
        _ => return None,
    })
}

/// Cookie value that queues `code` for the next page render.
pub fn set_cookie(code: &str) -> String {
    format!("{}={}; SameSite=Strict; Path=/; Max-Age=60", FLASH_COOKIE, code)
}

/// Cookie value that clears any pending flash.
pub fn clear_cookie() -> String {
    format!("{}=; SameSite=Strict; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// Read the pending flash message from request headers, if any.
pub fn take(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == FLASH_COOKIE {
                message(val).map(|m| m.to_string())
            } else {
                None
            }
        })
}
