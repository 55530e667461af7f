use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// Primary key of a persisted order, assigned by the store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A persisted order record, as stored and as returned over HTTP.
///
/// Wire shape: `{id, user_id, product_id, quantity, status}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned, immutable identifier.
    pub id: OrderId,
    /// External user reference. Not checked for existence.
    pub user_id: u32,
    /// External product reference. Not checked for existence.
    pub product_id: u32,
    /// Requested count. No bounds are enforced.
    pub quantity: i64,
    /// Lifecycle label; always `pending` at creation.
    pub status: OrderStatus,
}

/// Create-order payload.
///
/// All three fields are required and must be integers; the two references
/// must also be non-negative. Any `id` or `status` supplied by the client is
/// ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: u32,
    pub product_id: u32,
    pub quantity: i64,
}

impl NewOrder {
    /// Builds the persisted record for this payload under the given id.
    ///
    /// Status is always [`OrderStatus::Pending`].
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            product_id: self.product_id,
            quantity: self.quantity,
            status: OrderStatus::Pending,
        }
    }
}
