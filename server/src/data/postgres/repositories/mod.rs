//! Repository functions grouped by table
//!
//! Each function takes the pool explicitly; multi-statement writes run in
//! a transaction.

pub mod login_history;
pub mod permission;
pub mod role;
pub mod section;
pub mod user;
