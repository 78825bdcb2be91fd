// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Per-call outcomes of the store. Nothing here is fatal to the process:
/// validation failures surface verbatim, duplicate actions are reported as
/// `Ok` no-op values by the individual operations, and missing rows on
/// direct lookups come back as `None` rather than an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A cart or checkout line asked for more units than the product has.
    /// Carries the product name so the caller can surface the offender.
    #[error("insufficient stock for \"{product}\"")]
    InsufficientStock { product: String },

    #[error("{0}")]
    Validation(String),

    /// A mutation referenced a row that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration error: {0}")]
    Migration(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
