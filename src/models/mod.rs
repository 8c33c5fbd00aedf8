// src/models/mod.rs

pub mod course;
pub mod enrollment;
pub mod module;
pub mod money;
pub mod pagination;
pub mod response;
pub mod user;
