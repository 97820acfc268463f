use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Profile, User};
use crate::error::{AppError, AppResult};

pub const PAGE_SIZE: i64 = 10;

/// One page of results plus enough context to render pager links.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// A post joined with its author and engagement counts, as rendered in feeds.
#[derive(Debug, Clone)]
pub struct PostView {
    pub id: String,
    pub author: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub liked: bool,
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: String,
    pub author_id: String,
    pub author: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Out-of-range pages clamp to the nearest valid page instead of erroring.
fn clamp_page(total_items: i64, requested: i64) -> (i64, i64) {
    let total_pages = ((total_items + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    let page = requested.clamp(1, total_pages);
    (page, total_pages)
}

// -- Users and profiles --

/// Insert a user and its profile in one transaction. The profile row must
/// never exist without the user row, or vice versa.
pub fn create_user_with_profile(
    conn: &mut Connection,
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    password_hash: &str,
) -> AppResult<String> {
    let tx = conn.transaction()?;
    let user_id = uuid::Uuid::now_v7().to_string();
    tx.execute(
        "INSERT INTO users (id, username, email, first_name, last_name, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![user_id, username, email, first_name, last_name, password_hash],
    )?;
    tx.execute(
        "INSERT INTO profiles (id, user_id) VALUES (?1, ?2)",
        params![uuid::Uuid::now_v7().to_string(), user_id],
    )?;
    tx.commit()?;
    Ok(user_id)
}

pub fn username_taken(conn: &Connection, username: &str) -> AppResult<bool> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        params![username],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    conn.query_row(
        "SELECT id, username, email, first_name, last_name, password_hash, created_at
         FROM users WHERE username = ?1",
        params![username],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                password_hash: row.get(5)?,
                created_at: row.get(6)?,
            })
        },
    )
    .optional()
    .map_err(AppError::from)
}

pub fn profile_for_user(conn: &Connection, user_id: &str) -> AppResult<Profile> {
    conn.query_row(
        "SELECT id, user_id, bio, avatar_path, created_at, updated_at
         FROM profiles WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(Profile {
                id: row.get(0)?,
                user_id: row.get(1)?,
                bio: row.get(2)?,
                avatar_path: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        },
    )
    .optional()?
    .ok_or(AppError::NotFound)
}

pub fn update_user_and_profile(
    conn: &mut Connection,
    user_id: &str,
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    bio: &str,
    avatar_path: Option<&str>,
) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE users SET username = ?1, email = ?2, first_name = ?3, last_name = ?4
         WHERE id = ?5",
        params![username, email, first_name, last_name, user_id],
    )?;
    match avatar_path {
        Some(path) => tx.execute(
            "UPDATE profiles SET bio = ?1, avatar_path = ?2, updated_at = datetime('now')
             WHERE user_id = ?3",
            params![bio, path, user_id],
        )?,
        None => tx.execute(
            "UPDATE profiles SET bio = ?1, updated_at = datetime('now') WHERE user_id = ?2",
            params![bio, user_id],
        )?,
    };
    tx.commit()?;
    Ok(())
}

// -- Posts --

const POST_SELECT: &str = "
    SELECT p.id, u.username, p.content, p.image_path, p.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id),
           EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1)
    FROM posts p JOIN users u ON u.id = p.author_id";

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostView> {
    Ok(PostView {
        id: row.get(0)?,
        author: row.get(1)?,
        content: row.get(2)?,
        image_path: row.get(3)?,
        created_at: row.get(4)?,
        likes_count: row.get(5)?,
        comments_count: row.get(6)?,
        liked: row.get(7)?,
    })
}

/// Feed rules: a signed-in user following at least one person sees only posts
/// from followed authors; everyone else sees all posts. Newest first.
pub fn feed_page(conn: &Connection, viewer: Option<&str>, page: i64) -> AppResult<Page<PostView>> {
    let viewer_id = viewer.unwrap_or("");

    let follows_anyone: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1)",
        params![viewer_id],
        |row| row.get(0),
    )?;

    if follows_anyone {
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts p
             WHERE p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)",
            params![viewer_id],
            |row| row.get(0),
        )?;
        let (page, total_pages) = clamp_page(total, page);
        let sql = format!(
            "{POST_SELECT}
             WHERE p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)
             ORDER BY p.created_at DESC, p.rowid DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![viewer_id, PAGE_SIZE, (page - 1) * PAGE_SIZE],
                post_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            page,
            total_pages,
        })
    } else {
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        let (page, total_pages) = clamp_page(total, page);
        let sql = format!("{POST_SELECT} ORDER BY p.created_at DESC, p.rowid DESC LIMIT ?2 OFFSET ?3");
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![viewer_id, PAGE_SIZE, (page - 1) * PAGE_SIZE],
                post_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            page,
            total_pages,
        })
    }
}

/// Posts authored by one user, newest first, for the profile page.
pub fn author_posts_page(
    conn: &Connection,
    author_id: &str,
    viewer: Option<&str>,
    page: i64,
) -> AppResult<Page<PostView>> {
    let viewer_id = viewer.unwrap_or("");
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM posts WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )?;
    let (page, total_pages) = clamp_page(total, page);
    let sql = format!(
        "{POST_SELECT} WHERE p.author_id = ?2
         ORDER BY p.created_at DESC, p.rowid DESC LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            params![viewer_id, author_id, PAGE_SIZE, (page - 1) * PAGE_SIZE],
            post_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        items,
        page,
        total_pages,
    })
}

pub fn get_post(conn: &Connection, post_id: &str, viewer: Option<&str>) -> AppResult<PostView> {
    let viewer_id = viewer.unwrap_or("");
    let sql = format!("{POST_SELECT} WHERE p.id = ?2");
    conn.query_row(&sql, params![viewer_id, post_id], post_from_row)
        .optional()?
        .ok_or(AppError::NotFound)
}

pub fn create_post(
    conn: &Connection,
    author_id: &str,
    content: &str,
    image_path: Option<&str>,
) -> AppResult<String> {
    let post_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, author_id, content, image_path) VALUES (?1, ?2, ?3, ?4)",
        params![post_id, author_id, content, image_path],
    )?;
    Ok(post_id)
}

/// Delete a post if `user_id` is its author. Returns false (and leaves the
/// row intact) when someone else's post was targeted. Comments and likes go
/// with it via cascade.
pub fn delete_post(conn: &Connection, post_id: &str, user_id: &str) -> AppResult<bool> {
    let author_id: String = conn
        .query_row(
            "SELECT author_id FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    if author_id != user_id {
        return Ok(false);
    }

    conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
    Ok(true)
}

// -- Comments --

/// Comments on a post, oldest first.
pub fn post_comments(conn: &Connection, post_id: &str) -> AppResult<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.author_id, u.username, c.content, c.created_at
         FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.rowid ASC",
    )?;
    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                author_id: row.get(1)?,
                author: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn add_comment(
    conn: &Connection,
    post_id: &str,
    author_id: &str,
    content: &str,
) -> AppResult<CommentView> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
        params![post_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound);
    }

    let comment_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO comments (id, post_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
        params![comment_id, post_id, author_id, content],
    )?;
    conn.query_row(
        "SELECT c.id, c.author_id, u.username, c.content, c.created_at
         FROM comments c JOIN users u ON u.id = c.author_id WHERE c.id = ?1",
        params![comment_id],
        |row| {
            Ok(CommentView {
                id: row.get(0)?,
                author_id: row.get(1)?,
                author: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .map_err(AppError::from)
}

/// Delete a comment if `user_id` is its author. Returns the owning post id
/// (for the redirect back) and whether the delete happened.
pub fn delete_comment(
    conn: &Connection,
    comment_id: &str,
    user_id: &str,
) -> AppResult<(String, bool)> {
    let (post_id, author_id): (String, String) = conn
        .query_row(
            "SELECT post_id, author_id FROM comments WHERE id = ?1",
            params![comment_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    if author_id != user_id {
        return Ok((post_id, false));
    }

    conn.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
    Ok((post_id, true))
}

// -- Toggles --

/// Idempotent like toggle. The conditional insert is guarded by the
/// UNIQUE(post_id, user_id) constraint, so two racing identical requests
/// both succeed: one observes the insert, the other the delete. Returns
/// (liked, likes_count).
pub fn toggle_like(conn: &Connection, post_id: &str, user_id: &str) -> AppResult<(bool, i64)> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
        params![post_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound);
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO likes (id, post_id, user_id) VALUES (?1, ?2, ?3)",
        params![uuid::Uuid::now_v7().to_string(), post_id, user_id],
    )?;

    let liked = if inserted == 1 {
        true
    } else {
        conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        false
    };

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    Ok((liked, count))
}

/// Same toggle pattern keyed on (follower, following). Returns
/// (following, target's follower count, target's following count).
pub fn toggle_follow(
    conn: &Connection,
    follower_id: &str,
    following_id: &str,
) -> AppResult<(bool, i64, i64)> {
    // OR IGNORE would also swallow the self-follow CHECK violation, so
    // reject it here instead of relying on the constraint.
    if follower_id == following_id {
        return Err(AppError::BadRequest("You cannot follow yourself".into()));
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (id, follower_id, following_id) VALUES (?1, ?2, ?3)",
        params![uuid::Uuid::now_v7().to_string(), follower_id, following_id],
    )?;

    let following = if inserted == 1 {
        true
    } else {
        conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
        )?;
        false
    };

    let followers = follower_count(conn, following_id)?;
    let outbound = following_count(conn, following_id)?;
    Ok((following, followers, outbound))
}

pub fn is_following(conn: &Connection, follower_id: &str, following_id: &str) -> AppResult<bool> {
    let following: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2)",
        params![follower_id, following_id],
        |row| row.get(0),
    )?;
    Ok(following)
}

pub fn follower_count(conn: &Connection, user_id: &str) -> AppResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE following_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn following_count(conn: &Connection, user_id: &str) -> AppResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// -- Search --

/// Case-insensitive substring match on username, first or last name.
/// SQLite LIKE is case-insensitive for ASCII, which matches the original's
/// icontains behavior.
pub fn search_users(
    conn: &Connection,
    query: &str,
    exclude_user_id: Option<&str>,
) -> AppResult<Vec<UserSummary>> {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("%{}%", escaped);

    let mut stmt = conn.prepare(
        "SELECT username, first_name, last_name FROM users
         WHERE (username LIKE ?1 ESCAPE '\\'
                OR first_name LIKE ?1 ESCAPE '\\'
                OR last_name LIKE ?1 ESCAPE '\\')
           AND id != ?2
         ORDER BY username",
    )?;
    let users = stmt
        .query_map(params![pattern, exclude_user_id.unwrap_or("")], |row| {
            Ok(UserSummary {
                username: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
