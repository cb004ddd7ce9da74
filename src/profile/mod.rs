pub mod avatar;
pub mod service;

pub use avatar::AvatarChange;
pub use service::ProfileService;
