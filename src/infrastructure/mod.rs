//! Adapters implementing the domain ports.

pub mod in_memory;
pub mod mock_provider;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod stripe;
