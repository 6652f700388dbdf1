//! Account id generation.

use uuid::Uuid;

/// Source of fresh account ids.
pub trait IdGenerator: Send + Sync {
    /// Returns a new, globally unique id.
    fn generate(&self) -> String;
}

/// Time-ordered UUIDv7 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
