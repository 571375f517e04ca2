//! REST endpoint paths, relative to the configured base URL.

pub const LOGIN: &str = "/api/token/";
pub const REFRESH: &str = "/api/token/refresh/";
pub const ME: &str = "/api/usuarios/me/";

pub const CLIENTES: &str = "/api/clientes/";
pub const VENTAS: &str = "/api/ventas/";
pub const PRODUCTOS: &str = "/api/inventario/productos/";

pub const RESPUESTAS: &str = "/api/respuestas/";
pub const TAGS: &str = "/api/tags/";
pub const TAG_VISIBILITY: &str = "/api/tags/visibility/";
pub const TAG_TOGGLE_VISIBILITY: &str = "/api/tags/toggle-visibility/";
pub const TAG_REORDER: &str = "/api/tags/reorder/";

pub fn cliente(id: i64) -> String {
    format!("{}{}/", CLIENTES, id)
}

pub fn venta(id: i64) -> String {
    format!("{}{}/", VENTAS, id)
}

pub fn producto(id: i64) -> String {
    format!("{}{}/", PRODUCTOS, id)
}

pub fn respuesta(id: i64) -> String {
    format!("{}{}/", RESPUESTAS, id)
}
