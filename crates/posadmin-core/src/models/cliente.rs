use serde::{Deserialize, Serialize};

use crate::utils::{contains_ignore_case, format_phone};

/// A customer record from `/api/clientes/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Cliente {
    /// Assigned by the backend; omitted when creating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<i64>,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub direccion: String,
}

impl Cliente {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }

    pub fn phone_display(&self) -> String {
        format_phone(&self.telefono)
    }

    /// Client-side search over name, email and phone
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || contains_ignore_case(&self.full_name(), query)
            || contains_ignore_case(&self.email, query)
            || self.telefono.contains(query)
    }
}
