//! Data models for point-of-sale entities.
//!
//! Field names follow the backend's JSON so records deserialize directly:
//!
//! - `Cliente`: customers
//! - `Producto`: inventory items and their reorder threshold
//! - `Venta`, `DetalleVenta`, `NuevaVenta`: sales and sale creation
//! - `Usuario`: the logged-in account
//! - `Mensaje`, `Tag`, `TagVisibility`: message board

pub mod cliente;
pub mod decimal;
pub mod mensaje;
pub mod producto;
pub mod usuario;
pub mod venta;

pub use cliente::Cliente;
pub use mensaje::{Mensaje, Tag, TagOrder, TagVisibility};
pub use producto::{EstadoProducto, Producto};
pub use usuario::{Persona, TipoUsuario, Usuario};
pub use venta::{DetalleVenta, EstadoVenta, MetodoPago, NuevaVenta, NuevoDetalle, Venta};
