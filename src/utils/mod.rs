// src/utils/mod.rs

pub mod certificate;
pub mod hash;
pub mod html;
pub mod jwt;
pub mod multipart;
pub mod storage;
