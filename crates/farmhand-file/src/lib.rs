//! farmhand-file - File-backed credential persistence.

mod store;

pub use store::FileStore;
