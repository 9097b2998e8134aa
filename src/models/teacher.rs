use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A teacher account. Only its existence matters for write authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Teacher {
    pub username: String,
    pub display_name: Option<String>,
}
