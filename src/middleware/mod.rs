pub mod admin;
pub mod auth;
pub mod client_ip;
pub mod cookies;
pub mod edge_guard;
pub mod extension;
pub mod rate_limit;
