pub mod access_service;
pub mod auth;
pub mod permission_service;
pub mod profile_service;
pub mod role_service;
pub mod seed;
pub mod user_service;
