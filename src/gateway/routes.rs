//! Route table

use super::handlers::{
    create_post, create_user, delete_post, delete_user, feed, follow, followers, following,
    get_post, get_user, health_check, like_post, login, posts_by_author, search_users,
    unfollow, unlike_post, update_password, update_post, update_user,
};
use super::pipeline::Route;

/// Every HTTP endpoint. Only login, registration and health are public.
pub fn routes() -> Vec<Route> {
    vec![
        // Auth
        Route::post("/login", login),
        // Users
        Route::post("/users", create_user),
        Route::get("/users", search_users).authenticated(),
        Route::get("/users/{user_id}", get_user).authenticated(),
        Route::put("/users/{user_id}", update_user).authenticated(),
        Route::delete("/users/{user_id}", delete_user).authenticated(),
        Route::post("/users/{user_id}/follow", follow).authenticated(),
        Route::post("/users/{user_id}/unfollow", unfollow).authenticated(),
        Route::get("/users/{user_id}/followers", followers).authenticated(),
        Route::get("/users/{user_id}/following", following).authenticated(),
        Route::post("/users/{user_id}/update-password", update_password).authenticated(),
        // Posts
        Route::post("/posts", create_post).authenticated(),
        Route::get("/posts", feed).authenticated(),
        Route::get("/posts/{post_id}", get_post).authenticated(),
        Route::put("/posts/{post_id}", update_post).authenticated(),
        Route::delete("/posts/{post_id}", delete_post).authenticated(),
        Route::get("/users/{user_id}/posts", posts_by_author).authenticated(),
        Route::post("/posts/{post_id}/like", like_post).authenticated(),
        Route::post("/posts/{post_id}/unlike", unlike_post).authenticated(),
        // System
        Route::get("/health", health_check),
    ]
}
