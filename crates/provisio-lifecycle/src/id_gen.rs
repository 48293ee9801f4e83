use provisio_core::ResourceId;

/// Source of identifiers for new entities.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> ResourceId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> ResourceId {
        ResourceId::new()
    }
}
