pub mod account;
pub mod game;
pub mod review;

pub use account::{Account, Session};
pub use game::{Game, GameDetail, Screenshot};
pub use review::{AuthorSnapshot, NewReview, ReviewRecord, Score};
