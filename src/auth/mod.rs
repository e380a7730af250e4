//! Authentication and authorization modules.
//!
//! # Purpose
//! Groups the bearer-token codec, password hashing, the request admission
//! gate, the permission seeder, and the middleware chain.
pub mod middleware;
pub mod password;
pub mod rate_limit;
pub mod seed;
pub mod token;
