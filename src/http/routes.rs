use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{
    http::handlers::{
        create_review_handler, delete_review_handler, get_game_handler, get_game_reviews_handler,
        get_my_reviews_handler, get_profile_handler, login_handler, logout_handler,
        sign_up_handler, update_avatar_handler, update_email_handler, update_password_handler,
    },
    state::AppState,
};

pub fn create_http_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup", post(sign_up_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/games/{game_id}", get(get_game_handler))
        .route(
            "/games/{game_id}/reviews",
            get(get_game_reviews_handler).post(create_review_handler),
        )
        .route("/reviews/{review_id}", delete(delete_review_handler))
        .route("/me", get(get_profile_handler))
        .route("/me/reviews", get(get_my_reviews_handler))
        .route("/me/avatar", put(update_avatar_handler))
        .route("/me/email", put(update_email_handler))
        .route("/me/password", put(update_password_handler))
        .with_state(state)
}
