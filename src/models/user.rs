use serde::{Deserialize, Serialize};

use super::{Id, ProgresoGlobal};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

/// Preferencias del usuario. Los campos desconocidos se conservan para no
/// perderlos al reenviar el objeto completo en un `update_user`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferencias {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tema: Option<ThemeMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_discord: Option<bool>,
    #[serde(flatten)]
    pub otras: serde_json::Map<String, serde_json::Value>,
}

/// Inscripción del alumno en un proceso de selección
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcesoInscripcion {
    pub id: Id,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
}

/// Proceso de selección tal y como lo lista la portada
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proceso {
    pub id: Id,
    #[serde(default)]
    pub titulo: Option<String>,
    /// Hoja de ruta recomendada para el proceso
    #[serde(default)]
    pub ruta_id: Option<Id>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub progreso_global: Option<ProgresoGlobal>,
    #[serde(default)]
    pub preferencias: Preferencias,
    #[serde(default)]
    pub procesos: Vec<ProcesoInscripcion>,
}

/// Cuerpo parcial para `update_user`
#[derive(Clone, Debug, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferencias: Option<Preferencias>,
}

impl User {
    pub fn theme(&self) -> ThemeMode {
        self.preferencias.tema.unwrap_or_default()
    }

    pub fn is_inscrito(&self, proceso_id: Id) -> bool {
        self.procesos.iter().any(|p| p.id == proceso_id)
    }

    /// El widget de Discord se muestra salvo que el usuario lo haya cerrado
    pub fn shows_discord(&self) -> bool {
        self.preferencias.show_discord != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserialize_keeps_unknown_preferences() {
        let json = r#"{
            "id": 7,
            "email": "alumno@campus.dev",
            "preferencias": { "tema": "dark", "showDiscord": false, "idioma": "es" }
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.theme(), ThemeMode::Dark);
        assert!(!user.shows_discord());
        assert!(user.progreso_global.is_none());
        assert_eq!(user.preferencias.otras.get("idioma").and_then(|v| v.as_str()), Some("es"));

        let back = serde_json::to_value(&user.preferencias).unwrap();
        assert_eq!(back["idioma"], "es");
    }
}
