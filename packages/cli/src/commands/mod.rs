pub mod auth;
pub mod termpad;
