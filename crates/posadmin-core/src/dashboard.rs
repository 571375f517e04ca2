//! Aggregate figures for the dashboard.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{Cliente, Producto, Venta};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardStats {
    /// Sales dated on the reference day
    pub ventas_hoy: usize,
    pub total_ventas: usize,
    pub total_clientes: usize,
    pub productos_stock: usize,
    /// Products at or below their reorder threshold
    pub productos_bajo_stock: usize,
    /// Sum of non-cancelled sales on the reference day
    pub vendido_hoy: f64,
}

impl DashboardStats {
    /// Fetch sales, clients and products concurrently and summarise them.
    /// The first failure aborts the whole load.
    pub async fn fetch(api: &ApiClient, hoy: NaiveDate) -> Result<Self, ApiError> {
        let (ventas, clientes, productos) = futures::try_join!(
            api.fetch_ventas(""),
            api.fetch_clientes(""),
            api.fetch_productos(""),
        )?;
        debug!(
            ventas = ventas.len(),
            clientes = clientes.len(),
            productos = productos.len(),
            "Dashboard data loaded"
        );
        Ok(Self::compute(&ventas, &clientes, &productos, hoy))
    }

    pub fn compute(ventas: &[Venta], clientes: &[Cliente], productos: &[Producto], hoy: NaiveDate) -> Self {
        let de_hoy: Vec<&Venta> = ventas.iter().filter(|v| v.fecha == hoy).collect();

        Self {
            ventas_hoy: de_hoy.len(),
            total_ventas: ventas.len(),
            total_clientes: clientes.len(),
            productos_stock: productos.len(),
            productos_bajo_stock: productos.iter().filter(|p| p.necesita_reposicion()).count(),
            vendido_hoy: de_hoy
                .iter()
                .filter(|v| !v.is_cancelled())
                .map(|v| v.total)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstadoVenta, MetodoPago};

    fn venta(id: i64, fecha: NaiveDate, total: f64, estado: EstadoVenta) -> Venta {
        Venta {
            id_venta: id,
            usuario: None,
            cliente: None,
            id_cliente: None,
            fecha,
            total,
            metodo_pago: MetodoPago::Efectivo,
            estado,
            detalles: Vec::new(),
        }
    }

    fn producto(stock: i64, stock_minimo: i64) -> Producto {
        serde_json::from_value(serde_json::json!({
            "nombre": "x", "precio": "1.00", "stock": stock, "stock_minimo": stock_minimo
        }))
        .unwrap()
    }

    #[test]
    fn test_compute() {
        let hoy = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let ayer = hoy.pred_opt().unwrap();
        let ventas = vec![
            venta(1, hoy, 100.0, EstadoVenta::Completada),
            venta(2, hoy, 50.5, EstadoVenta::Pendiente),
            venta(3, hoy, 999.0, EstadoVenta::Cancelada),
            venta(4, ayer, 10.0, EstadoVenta::Completada),
        ];
        let productos = vec![producto(2, 5), producto(5, 5), producto(20, 5)];

        let stats = DashboardStats::compute(&ventas, &[], &productos, hoy);
        assert_eq!(stats.ventas_hoy, 3);
        assert_eq!(stats.total_ventas, 4);
        assert_eq!(stats.total_clientes, 0);
        assert_eq!(stats.productos_stock, 3);
        assert_eq!(stats.productos_bajo_stock, 2);
        assert_eq!(stats.vendido_hoy, 150.5);
    }

    #[test]
    fn test_compute_empty() {
        let hoy = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(DashboardStats::compute(&[], &[], &[], hoy), DashboardStats::default());
    }
}
