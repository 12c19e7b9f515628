//! Infrastructure layer - Store, crypto and background task implementations

pub mod credential;
pub mod crypto;
pub mod logging;
pub mod observability;
pub mod quota;
pub mod storage;
