use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::Todo;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// List window and filters parsed from a request.
///
/// `valid` is carried through but not applied by any query yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQueryFilter {
    pub page: i64,
    pub per: i64,
    pub valid: Option<bool>,
}

impl TodoQueryFilter {
    pub fn new(page: i64, per: i64) -> Self {
        Self {
            page,
            per,
            valid: None,
        }
    }

    /// `(limit, offset)` when both `page` and `per` are positive, `None` for the full set.
    ///
    /// Fails when the offset does not fit in an `i64`.
    pub fn window(&self) -> Result<Option<(i64, i64)>, RepoError> {
        if self.per <= 0 || self.page <= 0 {
            return Ok(None);
        }

        let offset = (self.page - 1)
            .checked_mul(self.per)
            .ok_or_else(|| RepoError::InvalidInput {
                message: format!(
                    "page {} with {} per page is out of range",
                    self.page, self.per
                ),
            })?;
        Ok(Some((self.per, offset)))
    }
}

#[async_trait]
pub trait TodosRepo: Send + Sync {
    /// Insert when unsaved, update otherwise. Stamps timestamps and fills in the generated id.
    async fn save(&self, todo: &mut Todo) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Todo, RepoError>;

    async fn list(&self, filter: &TodoQueryFilter) -> Result<Vec<Todo>, RepoError>;

    async fn count(&self, filter: &TodoQueryFilter) -> Result<i64, RepoError>;

    /// Removing a missing row is not an error.
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}
