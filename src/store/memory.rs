//! In-memory store for tests and local experiments
//!
//! Mirrors the PostgreSQL semantics: unique email/nickname, cascading user
//! deletes, idempotent follow and a like counter that never goes negative.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{NewPost, Post, User, UserProfile};
use super::{CredentialStore, PostStore, StoreError, StoreResult, UserStore};
use crate::auth::HashedCredential;
use crate::core_types::{PostId, UserId};

struct UserRow {
    user: User,
    password: HashedCredential,
}

struct PostRow {
    title: String,
    content: String,
    author_id: UserId,
    likes: u64,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, UserRow>,
    /// (user_id, follower_id)
    followers: BTreeSet<(UserId, UserId)>,
    posts: BTreeMap<PostId, PostRow>,
    next_user_id: UserId,
    next_post_id: PostId,
    writes: u64,
}

impl State {
    fn check_unique(&self, profile: &UserProfile, except: Option<UserId>) -> StoreResult<()> {
        for row in self.users.values() {
            if Some(row.user.id) == except {
                continue;
            }
            if row.user.email == profile.email {
                return Err(StoreError::Duplicate("email"));
            }
            if row.user.nickname == profile.nickname {
                return Err(StoreError::Duplicate("nickname"));
            }
        }
        Ok(())
    }

    fn post(&self, id: PostId, row: &PostRow) -> Post {
        let author_nickname = self
            .users
            .get(&row.author_id)
            .map(|u| u.user.nickname.clone())
            .unwrap_or_default();
        Post {
            id,
            title: row.title.clone(),
            content: row.content.clone(),
            author_id: row.author_id,
            author_nickname,
            likes: row.likes,
            created_at: row.created_at,
        }
    }

    fn users_where(&self, ids: impl Iterator<Item = UserId>) -> Vec<User> {
        ids.filter_map(|id| self.users.get(&id).map(|r| r.user.clone()))
            .collect()
    }

    fn post_mut(&mut self, post_id: PostId) -> StoreResult<&mut PostRow> {
        self.posts
            .get_mut(&post_id)
            .ok_or(StoreError::NotFound("post"))
    }
}

/// Thread-safe in-memory implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a user with a fixed id, bypassing uniqueness checks.
    pub fn seed_user(&self, user: User, password: HashedCredential) {
        let mut state = self.lock();
        state.next_user_id = state.next_user_id.max(user.id);
        state.users.insert(user.id, UserRow { user, password });
    }

    /// Insert a post with a fixed id.
    pub fn seed_post(&self, post_id: PostId, author_id: UserId, post: NewPost) {
        let mut state = self.lock();
        state.next_post_id = state.next_post_id.max(post_id);
        state.posts.insert(
            post_id,
            PostRow {
                title: post.title,
                content: post.content,
                author_id,
                likes: 0,
                created_at: Utc::now(),
            },
        );
    }

    /// Number of successful mutations since creation. Seeding does not count.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    pub fn is_following(&self, user_id: UserId, follower_id: UserId) -> bool {
        self.lock().followers.contains(&(user_id, follower_id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(
        &self,
        profile: &UserProfile,
        password: &HashedCredential,
    ) -> StoreResult<UserId> {
        let mut state = self.lock();
        state.check_unique(profile, None)?;

        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.insert(
            id,
            UserRow {
                user: User {
                    id,
                    name: profile.name.clone(),
                    nickname: profile.nickname.clone(),
                    email: profile.email.clone(),
                    created_at: Utc::now(),
                },
                password: password.clone(),
            },
        );
        state.writes += 1;
        Ok(id)
    }

    async fn search(&self, filter: &str) -> StoreResult<Vec<User>> {
        let needle = filter.to_lowercase();
        let state = self.lock();
        Ok(state
            .users
            .values()
            .filter(|r| {
                r.user.name.to_lowercase().contains(&needle)
                    || r.user.nickname.to_lowercase().contains(&needle)
            })
            .map(|r| r.user.clone())
            .collect())
    }

    async fn load(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&user_id).map(|r| r.user.clone()))
    }

    async fn update(&self, user_id: UserId, profile: &UserProfile) -> StoreResult<()> {
        let mut state = self.lock();
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("user"));
        }
        state.check_unique(profile, Some(user_id))?;

        if let Some(row) = state.users.get_mut(&user_id) {
            row.user.name = profile.name.clone();
            row.user.nickname = profile.nickname.clone();
            row.user.email = profile.email.clone();
        }
        state.writes += 1;
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> StoreResult<()> {
        let mut state = self.lock();
        if state.users.remove(&user_id).is_none() {
            return Err(StoreError::NotFound("user"));
        }
        state
            .followers
            .retain(|(user, follower)| *user != user_id && *follower != user_id);
        state.posts.retain(|_, p| p.author_id != user_id);
        state.writes += 1;
        Ok(())
    }

    async fn follow(&self, user_id: UserId, follower_id: UserId) -> StoreResult<()> {
        let mut state = self.lock();
        if !state.users.contains_key(&user_id) || !state.users.contains_key(&follower_id) {
            return Err(StoreError::NotFound("user"));
        }
        state.followers.insert((user_id, follower_id));
        state.writes += 1;
        Ok(())
    }

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> StoreResult<()> {
        let mut state = self.lock();
        state.followers.remove(&(user_id, follower_id));
        state.writes += 1;
        Ok(())
    }

    async fn followers(&self, user_id: UserId) -> StoreResult<Vec<User>> {
        let state = self.lock();
        let ids = state
            .followers
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, follower)| *follower);
        Ok(state.users_where(ids))
    }

    async fn following(&self, user_id: UserId) -> StoreResult<Vec<User>> {
        let state = self.lock();
        let ids = state
            .followers
            .iter()
            .filter(|(_, follower)| *follower == user_id)
            .map(|(user, _)| *user);
        Ok(state.users_where(ids))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<(UserId, HashedCredential)>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|r| r.user.email == email)
            .map(|r| (r.user.id, r.password.clone())))
    }

    async fn load_password_hash(&self, user_id: UserId) -> StoreResult<Option<HashedCredential>> {
        Ok(self.lock().users.get(&user_id).map(|r| r.password.clone()))
    }

    async fn replace_password_hash(
        &self,
        user_id: UserId,
        password: &HashedCredential,
    ) -> StoreResult<()> {
        let mut state = self.lock();
        let row = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("user"))?;
        row.password = password.clone();
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, author_id: UserId, post: &NewPost) -> StoreResult<PostId> {
        let mut state = self.lock();
        if !state.users.contains_key(&author_id) {
            return Err(StoreError::NotFound("user"));
        }
        state.next_post_id += 1;
        let id = state.next_post_id;
        state.posts.insert(
            id,
            PostRow {
                title: post.title.clone(),
                content: post.content.clone(),
                author_id,
                likes: 0,
                created_at: Utc::now(),
            },
        );
        state.writes += 1;
        Ok(id)
    }

    async fn feed(&self, user_id: UserId) -> StoreResult<Vec<Post>> {
        let state = self.lock();
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|(_, p)| {
                p.author_id == user_id || state.followers.contains(&(p.author_id, user_id))
            })
            .map(|(id, p)| state.post(*id, p))
            .collect())
    }

    async fn load(&self, post_id: PostId) -> StoreResult<Option<Post>> {
        let state = self.lock();
        Ok(state.posts.get(&post_id).map(|p| state.post(post_id, p)))
    }

    async fn load_owner_id(&self, post_id: PostId) -> StoreResult<Option<UserId>> {
        Ok(self.lock().posts.get(&post_id).map(|p| p.author_id))
    }

    async fn by_author(&self, author_id: UserId) -> StoreResult<Vec<Post>> {
        let state = self.lock();
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|(_, p)| p.author_id == author_id)
            .map(|(id, p)| state.post(*id, p))
            .collect())
    }

    async fn update(&self, post_id: PostId, post: &NewPost) -> StoreResult<()> {
        let mut state = self.lock();
        let row = state.post_mut(post_id)?;
        row.title = post.title.clone();
        row.content = post.content.clone();
        state.writes += 1;
        Ok(())
    }

    async fn delete(&self, post_id: PostId) -> StoreResult<()> {
        let mut state = self.lock();
        if state.posts.remove(&post_id).is_none() {
            return Err(StoreError::NotFound("post"));
        }
        state.writes += 1;
        Ok(())
    }

    async fn like(&self, post_id: PostId) -> StoreResult<()> {
        let mut state = self.lock();
        state.post_mut(post_id)?.likes += 1;
        state.writes += 1;
        Ok(())
    }

    async fn unlike(&self, post_id: PostId) -> StoreResult<()> {
        let mut state = self.lock();
        let row = state.post_mut(post_id)?;
        row.likes = row.likes.saturating_sub(1);
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(nickname: &str) -> UserProfile {
        UserProfile {
            name: nickname.to_uppercase(),
            nickname: nickname.to_string(),
            email: format!("{}@example.com", nickname),
        }
    }

    fn hash() -> HashedCredential {
        HashedCredential::from_stored("$argon2id$test")
    }

    fn post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_load_user() {
        let store = MemoryStore::new();
        let id = UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        let user = UserStore::load(&store, id).await.unwrap().unwrap();
        assert_eq!(user.nickname, "ada");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_nickname() {
        let store = MemoryStore::new();
        UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();

        let mut same_email = profile("grace");
        same_email.email = "ada@example.com".into();
        assert!(matches!(
            UserStore::create(&store, &same_email, &hash()).await,
            Err(StoreError::Duplicate("email"))
        ));
        assert!(matches!(
            UserStore::create(&store, &profile("ada"), &hash()).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_search_case_insensitive() {
        let store = MemoryStore::new();
        UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        UserStore::create(&store, &profile("grace"), &hash()).await.unwrap();

        let found = store.search("AD").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nickname, "ada");
        assert_eq!(store.search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let store = MemoryStore::new();
        UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        UserStore::create(&store, &profile("a_b"), &hash()).await.unwrap();
        UserStore::create(&store, &profile("50%off"), &hash()).await.unwrap();

        let found = store.search("_").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nickname, "a_b");

        let found = store.search("%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nickname, "50%off");

        assert!(store.search("a%b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_is_idempotent_and_listed() {
        let store = MemoryStore::new();
        let ada = UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        let bob = UserStore::create(&store, &profile("bob"), &hash()).await.unwrap();

        store.follow(ada, bob).await.unwrap();
        store.follow(ada, bob).await.unwrap();

        let followers = store.followers(ada).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, bob);
        assert_eq!(store.following(bob).await.unwrap()[0].id, ada);

        store.unfollow(ada, bob).await.unwrap();
        assert!(!store.is_following(ada, bob));
    }

    #[tokio::test]
    async fn test_feed_includes_own_and_followed_posts() {
        let store = MemoryStore::new();
        let ada = UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        let bob = UserStore::create(&store, &profile("bob"), &hash()).await.unwrap();
        let eve = UserStore::create(&store, &profile("eve"), &hash()).await.unwrap();

        let own = PostStore::create(&store, ada, &post("mine")).await.unwrap();
        let followed = PostStore::create(&store, bob, &post("bob's")).await.unwrap();
        PostStore::create(&store, eve, &post("eve's")).await.unwrap();
        store.follow(bob, ada).await.unwrap();

        let feed = store.feed(ada).await.unwrap();
        let ids: Vec<PostId> = feed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![followed, own]);
        assert_eq!(feed[0].author_nickname, "bob");
    }

    #[tokio::test]
    async fn test_unlike_never_negative() {
        let store = MemoryStore::new();
        let ada = UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        let id = PostStore::create(&store, ada, &post("p")).await.unwrap();

        store.unlike(id).await.unwrap();
        assert_eq!(PostStore::load(&store, id).await.unwrap().unwrap().likes, 0);

        store.like(id).await.unwrap();
        store.like(id).await.unwrap();
        store.unlike(id).await.unwrap();
        assert_eq!(PostStore::load(&store, id).await.unwrap().unwrap().likes, 1);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let ada = UserStore::create(&store, &profile("ada"), &hash()).await.unwrap();
        let bob = UserStore::create(&store, &profile("bob"), &hash()).await.unwrap();
        let id = PostStore::create(&store, ada, &post("p")).await.unwrap();
        store.follow(bob, ada).await.unwrap();

        UserStore::delete(&store, ada).await.unwrap();

        assert!(PostStore::load(&store, id).await.unwrap().is_none());
        assert!(store.followers(bob).await.unwrap().is_empty());
        assert!(matches!(
            UserStore::delete(&store, ada).await,
            Err(StoreError::NotFound("user"))
        ));
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.like(99).await,
            Err(StoreError::NotFound("post"))
        ));
        assert!(store.load_owner_id(99).await.unwrap().is_none());
    }
}
