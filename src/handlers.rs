pub mod auth;
pub mod permissions;
pub mod profile;
pub mod roles;
pub mod users;
