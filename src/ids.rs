//! Identity generation for new entities

/// Generate a fresh opaque identifier for a character, consumable or combat
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
