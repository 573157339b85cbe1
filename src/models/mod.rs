// src/models/mod.rs
pub mod class_teacher;
pub mod classe;
pub mod notification;
pub mod presence;
pub mod stats;
pub mod student;
pub mod user;
