#![forbid(unsafe_code)]

pub mod search;
pub mod version;
