pub mod auth;
pub mod game;
pub mod profile;
pub mod review;

pub use auth::{login_handler, logout_handler, sign_up_handler};

pub use game::get_game_handler;

pub use profile::{
    get_profile_handler, update_avatar_handler, update_email_handler, update_password_handler,
};

pub use review::{
    create_review_handler, delete_review_handler, get_game_reviews_handler,
    get_my_reviews_handler,
};
