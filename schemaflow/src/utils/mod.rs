//! Utility functions for identifiers, timestamps and content digests.

mod hashing;
mod timestamps;

pub use hashing::sha256_hex;
pub use timestamps::{elapsed_ms, iso_timestamp};

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}
