pub mod aggregate;
pub mod presentation;
pub mod repository;

pub use aggregate::ReviewStats;
pub use presentation::{ReviewListing, ReviewView};
pub use repository::ReviewRepository;
