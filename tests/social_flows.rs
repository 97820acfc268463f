//! End-to-end data-layer scenarios: registration, feed assembly, like and
//! follow toggles, cascade deletes, author-only deletion, and search.

use rusqlite::params;
use tempfile::TempDir;

use ripple::db::{self, queries};
use ripple::error::AppError;
use ripple::state::DbPool;

fn test_pool() -> (TempDir, DbPool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    (temp_dir, pool)
}

fn register(pool: &DbPool, username: &str, first: &str, last: &str) -> String {
    let mut conn = pool.get().unwrap();
    queries::create_user_with_profile(
        &mut conn,
        username,
        &format!("{}@example.com", username),
        first,
        last,
        "fake-hash",
    )
    .unwrap()
}

// -- Registration --

#[test]
fn registration_creates_profile_with_user() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    let profile_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM profiles WHERE user_id = ?1",
            params![alice],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(profile_count, 1);
}

#[test]
fn duplicate_registration_fails_and_leaves_no_orphan_profile() {
    let (_tmp, pool) = test_pool();
    register(&pool, "alice", "Alice", "Ames");

    let mut conn = pool.get().unwrap();
    let result = queries::create_user_with_profile(
        &mut conn,
        "alice",
        "other@example.com",
        "Other",
        "Person",
        "fake-hash",
    );
    assert!(result.is_err());

    let profiles: i64 = conn
        .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
        .unwrap();
    assert_eq!(profiles, 1);
}

// -- Feed --

#[test]
fn feed_shows_all_posts_when_following_nobody() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");

    let conn = pool.get().unwrap();
    queries::create_post(&conn, &alice, "first", None).unwrap();
    queries::create_post(&conn, &bob, "second", None).unwrap();

    // Bob follows nobody: both posts, newest first
    let page = queries::feed_page(&conn, Some(&bob), 1).unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].content, "second");
    assert_eq!(page.items[1].content, "first");

    // Anonymous viewer sees the same
    let anon = queries::feed_page(&conn, None, 1).unwrap();
    assert_eq!(anon.items.len(), 2);
}

#[test]
fn feed_is_restricted_to_followed_authors() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");
    let carol = register(&pool, "carol", "Carol", "Cole");

    let conn = pool.get().unwrap();
    queries::create_post(&conn, &alice, "from alice", None).unwrap();
    queries::create_post(&conn, &carol, "from carol", None).unwrap();
    queries::create_post(&conn, &bob, "from bob himself", None).unwrap();

    queries::toggle_follow(&conn, &bob, &alice).unwrap();

    let page = queries::feed_page(&conn, Some(&bob), 1).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].author, "alice");
}

#[test]
fn own_post_appears_at_top_of_own_feed() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    queries::create_post(&conn, &alice, "older", None).unwrap();
    let newest = queries::create_post(&conn, &alice, "hello world", None).unwrap();

    let page = queries::feed_page(&conn, Some(&alice), 1).unwrap();
    assert_eq!(page.items[0].id, newest);

    let global = queries::feed_page(&conn, None, 1).unwrap();
    assert_eq!(global.items[0].id, newest);
}

#[test]
fn feed_paginates_ten_per_page_and_clamps() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    for i in 0..25 {
        queries::create_post(&conn, &alice, &format!("post {}", i), None).unwrap();
    }

    let first = queries::feed_page(&conn, None, 1).unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_pages, 3);
    assert!(!first.has_prev());
    assert!(first.has_next());

    let last = queries::feed_page(&conn, None, 3).unwrap();
    assert_eq!(last.items.len(), 5);
    assert!(!last.has_next());

    // Out-of-range pages clamp instead of erroring
    let clamped = queries::feed_page(&conn, None, 99).unwrap();
    assert_eq!(clamped.page, 3);
    assert_eq!(clamped.items.len(), 5);
}

// -- Likes --

#[test]
fn like_toggles_on_then_off() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");

    let conn = pool.get().unwrap();
    let post = queries::create_post(&conn, &alice, "like me", None).unwrap();

    assert_eq!(queries::toggle_like(&conn, &post, &bob).unwrap(), (true, 1));
    assert_eq!(
        queries::toggle_like(&conn, &post, &bob).unwrap(),
        (false, 0)
    );
}

#[test]
fn likes_are_counted_once_per_user() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");

    let conn = pool.get().unwrap();
    let post = queries::create_post(&conn, &alice, "popular", None).unwrap();

    queries::toggle_like(&conn, &post, &alice).unwrap();
    let (_, count) = queries::toggle_like(&conn, &post, &bob).unwrap();
    assert_eq!(count, 2);

    let (liked, count) = queries::toggle_like(&conn, &post, &bob).unwrap();
    assert!(!liked);
    assert_eq!(count, 1);
}

#[test]
fn liking_a_missing_post_is_not_found() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    let result = queries::toggle_like(&conn, "no-such-post", &alice);
    assert!(matches!(result, Err(AppError::NotFound)));
}

// -- Follows --

#[test]
fn follow_toggles_on_then_off_with_counts() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");
    let carol = register(&pool, "carol", "Carol", "Cole");

    let conn = pool.get().unwrap();
    // Alice already follows Carol, so her outbound count is 1 throughout
    queries::toggle_follow(&conn, &alice, &carol).unwrap();

    let (following, followers, outbound) = queries::toggle_follow(&conn, &bob, &alice).unwrap();
    assert!(following);
    assert_eq!(followers, 1);
    assert_eq!(outbound, 1);
    assert!(queries::is_following(&conn, &bob, &alice).unwrap());

    let (following, followers, outbound) = queries::toggle_follow(&conn, &bob, &alice).unwrap();
    assert!(!following);
    assert_eq!(followers, 0);
    assert_eq!(outbound, 1);
    assert!(!queries::is_following(&conn, &bob, &alice).unwrap());
}

#[test]
fn self_follow_is_rejected_and_creates_no_edge() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    // The handler rejects this before the DB; the CHECK constraint backstops it
    assert!(queries::toggle_follow(&conn, &alice, &alice).is_err());

    let edges: i64 = conn
        .query_row("SELECT COUNT(*) FROM follows", [], |row| row.get(0))
        .unwrap();
    assert_eq!(edges, 0);
}

// -- Comments and deletion --

#[test]
fn comments_are_listed_oldest_first() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    let post = queries::create_post(&conn, &alice, "discuss", None).unwrap();
    queries::add_comment(&conn, &post, &alice, "first!").unwrap();
    queries::add_comment(&conn, &post, &alice, "second!").unwrap();

    let comments = queries::post_comments(&conn, &post).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "first!");
    assert_eq!(comments[1].content, "second!");
}

#[test]
fn commenting_on_a_missing_post_is_not_found() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    let result = queries::add_comment(&conn, "no-such-post", &alice, "hello?");
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[test]
fn deleting_a_post_cascades_to_comments_and_likes() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");

    let conn = pool.get().unwrap();
    let post = queries::create_post(&conn, &alice, "ephemeral", None).unwrap();
    queries::add_comment(&conn, &post, &bob, "nice").unwrap();
    queries::toggle_like(&conn, &post, &bob).unwrap();

    assert!(queries::delete_post(&conn, &post, &alice).unwrap());

    let comments: i64 = conn
        .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
        .unwrap();
    let likes: i64 = conn
        .query_row("SELECT COUNT(*) FROM likes", [], |row| row.get(0))
        .unwrap();
    assert_eq!(comments, 0);
    assert_eq!(likes, 0);
    assert!(matches!(
        queries::get_post(&conn, &post, None),
        Err(AppError::NotFound)
    ));
}

#[test]
fn only_the_author_can_delete_a_post() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");

    let conn = pool.get().unwrap();
    let post = queries::create_post(&conn, &alice, "mine", None).unwrap();

    assert!(!queries::delete_post(&conn, &post, &bob).unwrap());
    assert!(queries::get_post(&conn, &post, None).is_ok());
}

#[test]
fn only_the_author_can_delete_a_comment() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    let bob = register(&pool, "bob", "Bob", "Burns");

    let conn = pool.get().unwrap();
    let post = queries::create_post(&conn, &alice, "discuss", None).unwrap();
    let comment = queries::add_comment(&conn, &post, &bob, "my take").unwrap();

    let (post_id, deleted) = queries::delete_comment(&conn, &comment.id, &alice).unwrap();
    assert_eq!(post_id, post);
    assert!(!deleted);
    assert_eq!(queries::post_comments(&conn, &post).unwrap().len(), 1);

    let (_, deleted) = queries::delete_comment(&conn, &comment.id, &bob).unwrap();
    assert!(deleted);
    assert!(queries::post_comments(&conn, &post).unwrap().is_empty());
}

// -- Search --

#[test]
fn search_matches_username_and_names_case_insensitively() {
    let (_tmp, pool) = test_pool();
    register(&pool, "alice", "Alice", "Ames");
    register(&pool, "bob", "Bob", "Burns");
    register(&pool, "ali_baba", "Mustafa", "Hassan");

    let conn = pool.get().unwrap();
    let by_username = queries::search_users(&conn, "ALI", None).unwrap();
    assert_eq!(by_username.len(), 2);

    let by_last_name = queries::search_users(&conn, "burns", None).unwrap();
    assert_eq!(by_last_name.len(), 1);
    assert_eq!(by_last_name[0].username, "bob");
}

#[test]
fn search_excludes_the_requesting_user() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");
    register(&pool, "alicia", "Alicia", "Keys");

    let conn = pool.get().unwrap();
    let results = queries::search_users(&conn, "ali", Some(&alice)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].username, "alicia");
}

#[test]
fn search_treats_like_wildcards_literally() {
    let (_tmp, pool) = test_pool();
    register(&pool, "alice", "Alice", "Ames");

    let conn = pool.get().unwrap();
    assert!(queries::search_users(&conn, "%", None).unwrap().is_empty());
    assert!(queries::search_users(&conn, "_", None).unwrap().is_empty());
}

// -- Sessions --

#[test]
fn sessions_round_trip_and_expire() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice", "Alice", "Ames");

    let token = ripple::auth::session::create_session(&pool, &alice, 24).unwrap();
    assert_eq!(token.len(), 64);

    let conn = pool.get().unwrap();
    let live: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE token = ?1 AND expires_at > datetime('now'))",
            params![token],
            |row| row.get(0),
        )
        .unwrap();
    assert!(live);

    // An already-expired session is never considered live
    let expired = ripple::auth::session::create_session(&pool, &alice, 0).unwrap();
    let live: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE token = ?1 AND expires_at > datetime('now'))",
            params![expired],
            |row| row.get(0),
        )
        .unwrap();
    assert!(!live);

    ripple::auth::session::delete_session(&pool, &token).unwrap();
    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sessions WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}
