use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoritoTipo {
    Curso,
    Leccion,
    Certificacion,
}

/// Marcador de un usuario sobre un curso, lección o certificación.
/// `id == None` indica que el servidor aún no lo ha confirmado.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorito {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub user_id: Id,
    pub objeto_id: Id,
    pub tipo: FavoritoTipo,
    /// Objeto completo embebido, solo para pintar listados
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objeto: Option<serde_json::Value>,
}

impl Favorito {
    pub fn new(user_id: Id, objeto_id: Id, tipo: FavoritoTipo) -> Self {
        Self { id: None, user_id, objeto_id, tipo, objeto: None }
    }

    /// Identidad `(user_id, objeto_id, tipo)`
    pub fn same_target(&self, other: &Favorito) -> bool {
        self.user_id == other.user_id && self.objeto_id == other.objeto_id && self.tipo == other.tipo
    }

    /// Copia con solo los campos de referencia, lo que se envía al servidor
    pub fn without_objeto(&self) -> Self {
        Self { objeto: None, ..self.clone() }
    }

    pub fn titulo(&self) -> Option<&str> {
        let objeto = self.objeto.as_ref()?;
        objeto
            .get("titulo")
            .or_else(|| objeto.get("nombre"))
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_objeto_strips_payload() {
        let mut favorito = Favorito::new(7, 12, FavoritoTipo::Curso);
        favorito.objeto = Some(serde_json::json!({ "titulo": "Rust desde cero" }));

        assert_eq!(favorito.titulo(), Some("Rust desde cero"));

        let body = serde_json::to_value(favorito.without_objeto()).unwrap();
        assert_eq!(body, serde_json::json!({ "userId": 7, "objetoId": 12, "tipo": "curso" }));
    }

    #[test]
    fn test_same_target_ignores_id_and_objeto() {
        let a = Favorito::new(1, 2, FavoritoTipo::Leccion);
        let mut b = a.clone();
        b.id = Some(99);
        assert!(a.same_target(&b));
        assert!(!a.same_target(&Favorito::new(1, 2, FavoritoTipo::Curso)));
    }
}
