//! Dependency update automation library.
//!
//! This crate updates npm dependencies across git repositories by:
//! - Checking the working tree is clean and the update branch is new
//! - Querying `npm outdated` for direct dependencies
//! - Rewriting `package.json` while keeping each range's operator
//! - Committing the change on a new branch and pushing it
//! - Opening a pull request on the hosting service

pub mod config;
pub mod constants;
pub mod git;
pub mod github;
pub mod manifest;
pub mod npm;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod remote;
mod stages;
