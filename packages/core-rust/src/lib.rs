//! Order service core -- the order entity, its status lifecycle, and wire shapes.

pub mod status;
pub mod types;

pub use status::{OrderStatus, ParseStatusError};
pub use types::{NewOrder, Order, OrderId};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
