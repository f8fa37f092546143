//! # Variants
//!
//! A variant is one of several parallel categories that share the same patch shape
//! but differ in identifier, colour and bound field (e.g. the NCF types B01/B02/B14/B15).
//! The engine never names concrete variants; they come from the patch plan.

use serde::{Deserialize, Serialize};

/// Identifier, colour token and required field of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Variant code as written in the host document (e.g. `B01`).
    pub id: String,
    /// Style token used by generated markup (e.g. `green`).
    #[serde(alias = "color_token")]
    pub color: String,
    /// Field the variant's generated markup binds to (e.g. `b01ExpiryDate`).
    #[serde(alias = "required_field_name")]
    pub required_field: String,
}

impl VariantSpec {
    /// Creates a variant.
    pub fn new(
        id: impl Into<String>,
        color: impl Into<String>,
        required_field: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            required_field: required_field.into(),
        }
    }

    /// Lower-cased identifier, the prefix of the variant's record fields (`b01`).
    pub fn id_lower(&self) -> String {
        self.id.to_lowercase()
    }
}
