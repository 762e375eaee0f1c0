use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity is resolved upstream; the core only sees this id.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub Uuid);

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub player_id: Uuid,
    pub balance: u64,
}
