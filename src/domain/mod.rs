//! Domain types and the ports the application layer depends on.

pub mod checkout;
pub mod money;
pub mod parcel;
pub mod payment;
pub mod ports;
pub mod tracking;
