//! Command implementations

pub mod bookmark;
pub mod check;
pub mod enable;
pub mod export;
pub mod info;
pub mod install;
pub mod list;
pub mod remove;
pub mod sync;
pub mod update;
