//! Idempotent DDL, applied in order at startup.

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          BIGSERIAL PRIMARY KEY,
    name        VARCHAR(50)  NOT NULL,
    nickname    VARCHAR(50)  NOT NULL UNIQUE,
    email       VARCHAR(100) NOT NULL UNIQUE,
    password    VARCHAR(255) NOT NULL,
    created_at  TIMESTAMPTZ  NOT NULL DEFAULT NOW()
)"#;

const CREATE_FOLLOWERS: &str = r#"
CREATE TABLE IF NOT EXISTS followers (
    user_id     BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, follower_id)
)"#;

const CREATE_POSTS: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id          BIGSERIAL PRIMARY KEY,
    title       VARCHAR(50)  NOT NULL,
    content     VARCHAR(300) NOT NULL,
    author_id   BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    likes       BIGINT NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_POSTS_AUTHOR_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts (author_id)";

pub(super) const STATEMENTS: &[&str] = &[
    CREATE_USERS,
    CREATE_FOLLOWERS,
    CREATE_POSTS,
    CREATE_POSTS_AUTHOR_INDEX,
];
