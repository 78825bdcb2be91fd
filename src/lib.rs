// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Local relational store and repository layer for the FandomHub client:
//! social graph, posts and reactions, subscriptions, shop and orders,
//! moderation, notification digests and artist analytics, all backed by an
//! embedded SQLite database with change-driven live queries on top.

pub mod analytics;
pub mod config;
pub mod db;
pub mod digest;
pub mod error;
pub mod gating;
pub mod live;
pub mod models;
pub mod moderation;
pub mod notifications;
pub mod schema;
pub mod shop;
pub mod social;
pub mod store;
pub mod subscriptions;
pub mod users;

#[cfg(test)]
mod test_util;

pub use config::Config;
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use store::Store;
