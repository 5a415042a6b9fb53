use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  TEXT PRIMARY KEY,
            username            TEXT NOT NULL UNIQUE,
            password            TEXT NOT NULL,
            description         TEXT NOT NULL DEFAULT '',
            profile_image_ref   TEXT NOT NULL DEFAULT '',
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS statuses (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            posted_at   TEXT NOT NULL,
            edited      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_statuses_author
            ON statuses(author_id, posted_at);

        CREATE TABLE IF NOT EXISTS comments (
            id                  TEXT PRIMARY KEY,
            author_id           TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status_id           TEXT NOT NULL REFERENCES statuses(id) ON DELETE CASCADE,
            parent_comment_id   TEXT REFERENCES comments(id) ON DELETE SET NULL,
            content             TEXT NOT NULL,
            posted_at           TEXT NOT NULL,
            edited              INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_comments_status
            ON comments(status_id, posted_at);

        CREATE INDEX IF NOT EXISTS idx_comments_parent
            ON comments(parent_comment_id);

        CREATE TABLE IF NOT EXISTS circles (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_circles_owner
            ON circles(owner_id);

        -- Relation tables: one row per (actor, target) pair.

        CREATE TABLE IF NOT EXISTS status_likes (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status_id   TEXT NOT NULL REFERENCES statuses(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, status_id)
        );

        CREATE INDEX IF NOT EXISTS idx_status_likes_target
            ON status_likes(status_id);

        CREATE TABLE IF NOT EXISTS comment_likes (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            comment_id  TEXT NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, comment_id)
        );

        CREATE INDEX IF NOT EXISTS idx_comment_likes_target
            ON comment_likes(comment_id);

        CREATE TABLE IF NOT EXISTS circle_members (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            circle_id   TEXT NOT NULL REFERENCES circles(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, circle_id)
        );

        CREATE INDEX IF NOT EXISTS idx_circle_members_target
            ON circle_members(circle_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
