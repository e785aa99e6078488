//! Entity identifiers.
//!
//! Ids are random UUIDs rendered as 32 lowercase hex characters.

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
