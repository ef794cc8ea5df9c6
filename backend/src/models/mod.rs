// src/models/mod.rs

pub mod comment;
pub mod fight;
pub mod post;
pub mod user;
