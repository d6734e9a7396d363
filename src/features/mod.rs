pub mod auth;
pub mod comments;
pub mod files;
pub mod groups;
pub mod posts;
pub mod users;
