use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cliente, Producto, Usuario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum MetodoPago {
    Efectivo,
    Tarjeta,
    Transferencia,
}

impl MetodoPago {
    pub fn label(&self) -> &'static str {
        match self {
            MetodoPago::Efectivo => "Efectivo",
            MetodoPago::Tarjeta => "Tarjeta",
            MetodoPago::Transferencia => "Transferencia",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum EstadoVenta {
    #[default]
    Pendiente,
    Completada,
    Cancelada,
}

/// A line item of a sale as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DetalleVenta {
    #[serde(default)]
    pub id_detalle: Option<i64>,
    #[serde(default)]
    pub producto: Option<Producto>,
    #[serde(default)]
    pub id_producto: Option<i64>,
    pub cantidad: i64,
    #[serde(with = "super::decimal")]
    pub precio_unitario: f64,
    #[serde(default, with = "super::decimal::option")]
    pub subtotal: Option<f64>,
}

impl DetalleVenta {
    /// Backend subtotal, or `cantidad × precio_unitario` when absent
    pub fn subtotal(&self) -> f64 {
        self.subtotal
            .unwrap_or(self.cantidad as f64 * self.precio_unitario)
    }
}

/// A sale from `/api/ventas/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Venta {
    pub id_venta: i64,
    #[serde(default)]
    pub usuario: Option<Usuario>,
    #[serde(default)]
    pub cliente: Option<Cliente>,
    #[serde(default)]
    pub id_cliente: Option<i64>,
    pub fecha: NaiveDate,
    #[serde(with = "super::decimal")]
    pub total: f64,
    pub metodo_pago: MetodoPago,
    #[serde(default)]
    pub estado: EstadoVenta,
    #[serde(default)]
    pub detalles: Vec<DetalleVenta>,
}

impl Venta {
    pub fn is_cancelled(&self) -> bool {
        self.estado == EstadoVenta::Cancelada
    }

    pub fn cliente_display(&self) -> String {
        self.cliente
            .as_ref()
            .map(|c| c.full_name())
            .unwrap_or_else(|| "Público general".to_string())
    }
}

/// One line of a sale being created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NuevoDetalle {
    pub id_producto: i64,
    pub cantidad: i64,
    #[serde(with = "super::decimal")]
    pub precio_unitario: f64,
}

impl NuevoDetalle {
    pub fn from_producto(producto: &Producto, cantidad: i64) -> Option<Self> {
        Some(Self {
            id_producto: producto.id_producto?,
            cantidad,
            precio_unitario: producto.precio,
        })
    }

    pub fn subtotal(&self) -> f64 {
        self.cantidad as f64 * self.precio_unitario
    }
}

/// Payload for `POST /api/ventas/`. The backend recomputes the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NuevaVenta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<i64>,
    pub metodo_pago: MetodoPago,
    pub detalles: Vec<NuevoDetalle>,
}

impl NuevaVenta {
    pub fn new(metodo_pago: MetodoPago) -> Self {
        Self {
            id_cliente: None,
            metodo_pago,
            detalles: Vec::new(),
        }
    }

    /// Add a line, merging with an existing line for the same product
    pub fn add(&mut self, detalle: NuevoDetalle) {
        match self
            .detalles
            .iter_mut()
            .find(|d| d.id_producto == detalle.id_producto)
        {
            Some(existing) => existing.cantidad += detalle.cantidad,
            None => self.detalles.push(detalle),
        }
    }

    pub fn total(&self) -> f64 {
        self.detalles.iter().map(NuevoDetalle::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.detalles.is_empty()
    }
}
