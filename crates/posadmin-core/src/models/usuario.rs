use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TipoUsuario {
    Administrador,
    Cajero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Persona {
    pub id_persona: i64,
    pub nombre: String,
    pub apellido: String,
}

/// The account returned by `/api/usuarios/me/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Usuario {
    pub id_usuario: i64,
    pub nombre_usuario: String,
    pub email: String,
    pub tipo_usuario: TipoUsuario,
    #[serde(default)]
    pub persona: Option<Persona>,
}

impl Usuario {
    pub fn is_admin(&self) -> bool {
        self.tipo_usuario == TipoUsuario::Administrador
    }

    /// Person's name when known, otherwise the username
    pub fn display_name(&self) -> String {
        match self.persona {
            Some(ref p) => format!("{} {}", p.nombre, p.apellido),
            None => self.nombre_usuario.clone(),
        }
    }
}
