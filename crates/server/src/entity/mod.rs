pub mod channel_identity;
pub mod notification_preference;
pub mod tracked_domain;
pub mod user;
