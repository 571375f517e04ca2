use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

/// Default reorder threshold used by the backend
const DEFAULT_STOCK_MINIMO: i64 = 5;

fn default_stock_minimo() -> i64 {
    DEFAULT_STOCK_MINIMO
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum EstadoProducto {
    #[default]
    Activo,
    Inactivo,
}

/// An inventory item from `/api/inventario/productos/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Producto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_producto: Option<i64>,
    #[serde(default)]
    pub codigo_barras: Option<String>,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(with = "super::decimal")]
    pub precio: f64,
    pub stock: i64,
    #[serde(default = "default_stock_minimo")]
    pub stock_minimo: i64,
    #[serde(default)]
    pub categoria: Option<i64>,
    #[serde(default, skip_serializing)]
    pub categoria_nombre: Option<String>,
    #[serde(default)]
    pub estado: EstadoProducto,
    #[serde(default, skip_serializing)]
    pub fecha_creacion: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub fecha_actualizacion: Option<DateTime<Utc>>,
}

impl Producto {
    /// Stock at or below the reorder threshold
    pub fn necesita_reposicion(&self) -> bool {
        self.stock <= self.stock_minimo
    }

    pub fn is_active(&self) -> bool {
        self.estado == EstadoProducto::Activo
    }

    /// Client-side search over name, barcode and category
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || contains_ignore_case(&self.nombre, query)
            || self
                .codigo_barras
                .as_deref()
                .map(|c| c.contains(query))
                .unwrap_or(false)
            || self
                .categoria_nombre
                .as_deref()
                .map(|c| contains_ignore_case(c, query))
                .unwrap_or(false)
    }
}
