#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod groupie_utils;
pub mod matcher;
pub mod models;
pub mod render;
pub mod upstream;

#[cfg(test)]
pub mod stub;
