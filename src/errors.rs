// Copyright (c) Fintrack Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Error taxonomy for the budget and goal engines. Ownership is checked
/// before any domain logic runs, so a Forbidden result implies the entity
/// exists; NotFound implies the id does not resolve at all.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("not authorized to access {entity} {id}")]
    Forbidden { entity: &'static str, id: i64 },
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        EngineError::NotFound { entity, id }
    }

    pub fn forbidden(entity: &'static str, id: i64) -> Self {
        EngineError::Forbidden { entity, id }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
