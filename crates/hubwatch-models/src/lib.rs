//! Core data models for Hubwatch.
//!
//! This crate provides the data types shared by the GitHub client and the
//! Telegram bot: channel and repository identifiers, subscriptions, commits
//! and the notifications built from them.

pub mod commit;
pub mod ids;
pub mod repository;
pub mod subscription;

// Re-export main types
pub use commit::{CommitInfo, CommitNotification};
pub use ids::{ChannelId, RepoId};
pub use repository::{Repository, RepositoryOwner};
pub use subscription::Subscription;
