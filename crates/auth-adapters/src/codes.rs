use domains::CodeGenerator;
use uuid::Uuid;

/// 32 hex characters from a random v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCodeGenerator;

impl CodeGenerator for UuidCodeGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
