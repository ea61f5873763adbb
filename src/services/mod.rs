pub mod clock;
pub mod metrics;
pub mod password;
pub mod rate_limit;
pub mod tokens;
