pub(crate) mod activities;
pub(crate) mod admins;
pub(crate) mod exams;
pub(crate) mod free_videos;
pub(crate) mod health;
pub(crate) mod questions;
pub(crate) mod results;
pub(crate) mod students;
pub(crate) mod videos;
