use crate::cache::CacheError;
use crate::db::DbError;
use crate::filter::FilterError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy.
///
/// `Filter`, `NotFilterable` and `NotFound` are caller faults; `Query` and
/// `Cache` come from collaborators and carry the failing operation.
#[derive(Debug)]
pub enum RepoError {
    Filter(FilterError),
    NotFilterable {
        field: String,
    },
    NotFound {
        entity: &'static str,
        key: String,
    },
    Query {
        operation: &'static str,
        entity: &'static str,
        source: DbError,
    },
    Cache(CacheError),
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether the failure should map to a 4xx-class response.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Filter(_) | Self::NotFilterable { .. } | Self::NotFound { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter(err) => write!(f, "{err}"),
            Self::NotFilterable { field } => write!(f, "field `{field}` is not filterable"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Query {
                operation,
                entity,
                source,
            } => write!(f, "{operation} on {entity} failed: {source}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Filter(err) => Some(err),
            Self::Query { source, .. } => Some(source),
            Self::Cache(err) => Some(err),
            Self::NotFilterable { .. } | Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<FilterError> for RepoError {
    fn from(value: FilterError) -> Self {
        Self::Filter(value)
    }
}

impl From<CacheError> for RepoError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}
