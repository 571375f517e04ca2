use serde::{Deserialize, Serialize};

/// A message-board tag from `/api/tags/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Tag {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub respuestas_count: i64,
}

/// Per-tag display settings from `/api/tags/visibility/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TagVisibility {
    pub tag_id: i64,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub order: i64,
}

/// One entry of a `/api/tags/reorder/` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TagOrder {
    pub tag_id: i64,
    pub order: i64,
}

/// A saved reply on the message board (`/api/respuestas/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Mensaje {
    pub id: i64,
    pub contenido: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Mensaje {
    pub fn has_tag(&self, nombre: &str) -> bool {
        self.tags.iter().any(|t| t.nombre == nombre)
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.nombre.clone()).collect()
    }
}
