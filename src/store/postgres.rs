//! PostgreSQL implementation of the store traits

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::models::{NewPost, Post, User, UserProfile};
use super::{CredentialStore, PostStore, StoreError, StoreResult, UserStore};
use crate::auth::HashedCredential;
use crate::core_types::{PostId, UserId};

const USER_COLUMNS: &str = "u.id, u.name, u.nickname, u.email, u.created_at";

const POST_COLUMNS: &str =
    "p.id, p.title, p.content, p.author_id, u.nickname AS author_nickname, p.likes, p.created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Ids above `i64::MAX` cannot exist in a BIGSERIAL column.
fn db_id(id: u64, what: &'static str) -> StoreResult<i64> {
    i64::try_from(id).map_err(|_| StoreError::NotFound(what))
}

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get::<i64, _>("id") as UserId,
        name: r.get("name"),
        nickname: r.get("nickname"),
        email: r.get("email"),
        created_at: r.get("created_at"),
    }
}

fn post_from_row(r: &PgRow) -> Post {
    Post {
        id: r.get::<i64, _>("id") as PostId,
        title: r.get("title"),
        content: r.get("content"),
        author_id: r.get::<i64, _>("author_id") as UserId,
        author_nickname: r.get("author_nickname"),
        likes: r.get::<i64, _>("likes").max(0) as u64,
        created_at: r.get("created_at"),
    }
}

/// Translate constraint violations into domain errors.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("nickname") => "nickname",
                _ => "value",
            };
            return StoreError::Duplicate(field);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound("user");
        }
    }
    StoreError::Database(err)
}

fn expect_one(rows_affected: u64, what: &'static str) -> StoreResult<()> {
    if rows_affected == 0 {
        Err(StoreError::NotFound(what))
    } else {
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(
        &self,
        profile: &UserProfile,
        password: &HashedCredential,
    ) -> StoreResult<UserId> {
        let row = sqlx::query(
            r#"INSERT INTO users (name, nickname, email, password)
               VALUES ($1, $2, $3, $4) RETURNING id"#,
        )
        .bind(&profile.name)
        .bind(&profile.nickname)
        .bind(&profile.email)
        .bind(password.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.get::<i64, _>("id") as UserId)
    }

    async fn search(&self, filter: &str) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&search_query())
            .bind(filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn load(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS))
            .bind(db_id(user_id, "user")?)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update(&self, user_id: UserId, profile: &UserProfile) -> StoreResult<()> {
        let result =
            sqlx::query(r#"UPDATE users SET name = $1, nickname = $2, email = $3 WHERE id = $4"#)
                .bind(&profile.name)
                .bind(&profile.nickname)
                .bind(&profile.email)
                .bind(db_id(user_id, "user")?)
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;

        expect_one(result.rows_affected(), "user")
    }

    async fn delete(&self, user_id: UserId) -> StoreResult<()> {
        // Posts and follow edges go with the user via ON DELETE CASCADE.
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(db_id(user_id, "user")?)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "user")
    }

    async fn follow(&self, user_id: UserId, follower_id: UserId) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO followers (user_id, follower_id) VALUES ($1, $2)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(db_id(user_id, "user")?)
        .bind(db_id(follower_id, "user")?)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM followers WHERE user_id = $1 AND follower_id = $2"#)
            .bind(db_id(user_id, "user")?)
            .bind(db_id(follower_id, "user")?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn followers(&self, user_id: UserId) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users u INNER JOIN followers f ON u.id = f.follower_id \
             WHERE f.user_id = $1 ORDER BY u.id",
            USER_COLUMNS
        ))
        .bind(db_id(user_id, "user")?)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn following(&self, user_id: UserId) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users u INNER JOIN followers f ON u.id = f.user_id \
             WHERE f.follower_id = $1 ORDER BY u.id",
            USER_COLUMNS
        ))
        .bind(db_id(user_id, "user")?)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<(UserId, HashedCredential)>> {
        let row = sqlx::query(r#"SELECT id, password FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| {
            (
                r.get::<i64, _>("id") as UserId,
                HashedCredential::from_stored(r.get::<String, _>("password")),
            )
        }))
    }

    async fn load_password_hash(&self, user_id: UserId) -> StoreResult<Option<HashedCredential>> {
        let row = sqlx::query(r#"SELECT password FROM users WHERE id = $1"#)
            .bind(db_id(user_id, "user")?)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| HashedCredential::from_stored(r.get::<String, _>("password"))))
    }

    async fn replace_password_hash(
        &self,
        user_id: UserId,
        password: &HashedCredential,
    ) -> StoreResult<()> {
        let result = sqlx::query(r#"UPDATE users SET password = $1 WHERE id = $2"#)
            .bind(password.as_str())
            .bind(db_id(user_id, "user")?)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "user")
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create(&self, author_id: UserId, post: &NewPost) -> StoreResult<PostId> {
        let row = sqlx::query(
            r#"INSERT INTO posts (title, content, author_id) VALUES ($1, $2, $3) RETURNING id"#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(db_id(author_id, "user")?)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.get::<i64, _>("id") as PostId)
    }

    async fn feed(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT {} FROM posts p \
             INNER JOIN users u ON u.id = p.author_id \
             LEFT JOIN followers f ON f.user_id = p.author_id \
             WHERE p.author_id = $1 OR f.follower_id = $1 \
             ORDER BY p.id DESC",
            POST_COLUMNS
        ))
        .bind(db_id(user_id, "user")?)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn load(&self, post_id: PostId) -> StoreResult<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts p INNER JOIN users u ON u.id = p.author_id WHERE p.id = $1",
            POST_COLUMNS
        ))
        .bind(db_id(post_id, "post")?)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn load_owner_id(&self, post_id: PostId) -> StoreResult<Option<UserId>> {
        let row = sqlx::query(r#"SELECT author_id FROM posts WHERE id = $1"#)
            .bind(db_id(post_id, "post")?)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<i64, _>("author_id") as UserId))
    }

    async fn by_author(&self, author_id: UserId) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts p INNER JOIN users u ON u.id = p.author_id \
             WHERE p.author_id = $1 ORDER BY p.id DESC",
            POST_COLUMNS
        ))
        .bind(db_id(author_id, "user")?)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn update(&self, post_id: PostId, post: &NewPost) -> StoreResult<()> {
        let result = sqlx::query(r#"UPDATE posts SET title = $1, content = $2 WHERE id = $3"#)
            .bind(&post.title)
            .bind(&post.content)
            .bind(db_id(post_id, "post")?)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "post")
    }

    async fn delete(&self, post_id: PostId) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
            .bind(db_id(post_id, "post")?)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "post")
    }

    async fn like(&self, post_id: PostId) -> StoreResult<()> {
        let result = sqlx::query(r#"UPDATE posts SET likes = likes + 1 WHERE id = $1"#)
            .bind(db_id(post_id, "post")?)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "post")
    }

    async fn unlike(&self, post_id: PostId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE posts SET likes = CASE WHEN likes > 0 THEN likes - 1 ELSE 0 END
               WHERE id = $1"#,
        )
        .bind(db_id(post_id, "post")?)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected(), "post")
    }
}

/// Case-insensitive substring match on name or nickname. `strpos` takes the
/// filter literally, so `%` and `_` match only themselves.
fn search_query() -> String {
    format!(
        "SELECT {} FROM users u \
         WHERE strpos(lower(u.name), lower($1)) > 0 \
            OR strpos(lower(u.nickname), lower($1)) > 0 \
         ORDER BY u.id",
        USER_COLUMNS
    )
}
