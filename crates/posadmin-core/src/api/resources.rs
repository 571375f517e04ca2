//! Resource endpoints: clients, products, sales, the current user and the
//! message board. Each call goes through [`ApiClient::execute`], so an
//! expired access token is refreshed transparently.

use serde::Serialize;
use serde_json::json;

use crate::models::{
    Cliente, Mensaje, NuevaVenta, Producto, Tag, TagOrder, TagVisibility, Usuario, Venta,
};

use super::{endpoints, ApiClient, ApiError, ApiRequest};

#[derive(Debug, Serialize)]
struct NuevoMensaje<'a> {
    contenido: &'a str,
    tags_list: Vec<&'a str>,
}

impl ApiClient {
    // ===== Current user =====

    pub async fn fetch_current_user(&self) -> Result<Usuario, ApiError> {
        self.send(ApiRequest::get(endpoints::ME)).await
    }

    // ===== Clientes =====

    /// List clients; `busqueda` is sent as `?q=` only when non-empty
    pub async fn fetch_clientes(&self, busqueda: &str) -> Result<Vec<Cliente>, ApiError> {
        self.send(ApiRequest::get(endpoints::CLIENTES).query_if_present("q", busqueda))
            .await
    }

    pub async fn create_cliente(&self, cliente: &Cliente) -> Result<Cliente, ApiError> {
        self.send(ApiRequest::post(endpoints::CLIENTES).json(cliente)?)
            .await
    }

    pub async fn update_cliente(&self, id: i64, cliente: &Cliente) -> Result<Cliente, ApiError> {
        self.send(ApiRequest::put(endpoints::cliente(id)).json(cliente)?)
            .await
    }

    pub async fn delete_cliente(&self, id: i64) -> Result<(), ApiError> {
        self.send_discarding(ApiRequest::delete(endpoints::cliente(id)))
            .await
    }

    // ===== Productos =====

    pub async fn fetch_productos(&self, busqueda: &str) -> Result<Vec<Producto>, ApiError> {
        self.send(ApiRequest::get(endpoints::PRODUCTOS).query_if_present("q", busqueda))
            .await
    }

    pub async fn create_producto(&self, producto: &Producto) -> Result<Producto, ApiError> {
        self.send(ApiRequest::post(endpoints::PRODUCTOS).json(producto)?)
            .await
    }

    pub async fn update_producto(&self, id: i64, producto: &Producto) -> Result<Producto, ApiError> {
        self.send(ApiRequest::put(endpoints::producto(id)).json(producto)?)
            .await
    }

    pub async fn delete_producto(&self, id: i64) -> Result<(), ApiError> {
        self.send_discarding(ApiRequest::delete(endpoints::producto(id)))
            .await
    }

    // ===== Ventas =====

    /// List sales; `fecha` (YYYY-MM-DD) is sent only when non-empty
    pub async fn fetch_ventas(&self, fecha: &str) -> Result<Vec<Venta>, ApiError> {
        self.send(ApiRequest::get(endpoints::VENTAS).query_if_present("fecha", fecha))
            .await
    }

    pub async fn fetch_venta(&self, id: i64) -> Result<Venta, ApiError> {
        self.send(ApiRequest::get(endpoints::venta(id))).await
    }

    pub async fn create_venta(&self, venta: &NuevaVenta) -> Result<Venta, ApiError> {
        if venta.is_empty() {
            return Err(ApiError::Validation("a sale needs at least one line".to_string()));
        }
        self.send(ApiRequest::post(endpoints::VENTAS).json(venta)?)
            .await
    }

    // ===== Message board =====

    pub async fn fetch_mensajes(&self) -> Result<Vec<Mensaje>, ApiError> {
        self.send(ApiRequest::get(endpoints::RESPUESTAS)).await
    }

    pub async fn create_mensaje(&self, contenido: &str, tag: Option<&str>) -> Result<Mensaje, ApiError> {
        let body = NuevoMensaje {
            contenido,
            tags_list: tag.into_iter().filter(|t| !t.trim().is_empty()).collect(),
        };
        self.send(ApiRequest::post(endpoints::RESPUESTAS).json(&body)?)
            .await
    }

    pub async fn update_mensaje_contenido(&self, id: i64, contenido: &str) -> Result<Mensaje, ApiError> {
        self.send(ApiRequest::patch(endpoints::respuesta(id)).json(&json!({ "contenido": contenido }))?)
            .await
    }

    pub async fn update_mensaje_tags(&self, id: i64, tags_list: &[String]) -> Result<Mensaje, ApiError> {
        self.send(ApiRequest::patch(endpoints::respuesta(id)).json(&json!({ "tags_list": tags_list }))?)
            .await
    }

    pub async fn delete_mensaje(&self, id: i64) -> Result<(), ApiError> {
        self.send_discarding(ApiRequest::delete(endpoints::respuesta(id)))
            .await
    }

    pub async fn fetch_tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.send(ApiRequest::get(endpoints::TAGS)).await
    }

    pub async fn fetch_tag_visibility(&self) -> Result<Vec<TagVisibility>, ApiError> {
        self.send(ApiRequest::get(endpoints::TAG_VISIBILITY)).await
    }

    pub async fn set_tag_hidden(&self, tag_id: i64, is_hidden: bool) -> Result<(), ApiError> {
        let request = ApiRequest::post(endpoints::TAG_TOGGLE_VISIBILITY)
            .json(&json!({ "tag_id": tag_id, "is_hidden": is_hidden }))?;
        self.send_discarding(request).await
    }

    pub async fn reorder_tags(&self, tag_order: &[TagOrder]) -> Result<(), ApiError> {
        let request = ApiRequest::post(endpoints::TAG_REORDER).json(&json!({ "tag_order": tag_order }))?;
        self.send_discarding(request).await
    }
}
