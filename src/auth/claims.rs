use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two signing secrets and lifetimes a token uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub authorized: bool, // always true for tokens we issue
    pub user_id: Uuid,    // subject
    pub id: Uuid,         // unique per token
    pub exp: usize,       // expires at (unix timestamp)
}
