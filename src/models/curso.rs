// ============================================================================
// CURSOS - Cursos, módulos, lecciones y certificaciones
// ============================================================================
// Solo los campos sobre los que razona la caché de progreso.
// ============================================================================

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeccionTipo {
    Video,
    Markdown,
    Diapositiva,
    Entregable,
    Autocorregible,
    Zoom,
    Recurso,
    #[serde(other)]
    Otro,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeccionMeta {
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leccion {
    pub id: Id,
    #[serde(default)]
    pub titulo: String,
    pub modulo_id: Id,
    #[serde(default)]
    pub tipo: Option<LeccionTipo>,
    #[serde(default)]
    pub meta: LeccionMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modulo {
    pub id: Id,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub lecciones: Vec<Leccion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CursoMeta {
    #[serde(default)]
    pub progreso_count: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curso {
    pub id: Id,
    #[serde(default)]
    pub titulo: String,
    #[serde(default = "default_disponible")]
    pub disponible: bool,
    #[serde(default)]
    pub modulos: Vec<Modulo>,
    #[serde(default)]
    pub meta: CursoMeta,
}

fn default_disponible() -> bool {
    true
}

impl Curso {
    fn lecciones(&self) -> impl Iterator<Item = &Leccion> {
        self.modulos.iter().flat_map(|m| m.lecciones.iter())
    }

    /// Versión de la lección que trae el curso (con `meta` calculada para el usuario)
    pub fn find_leccion(&self, leccion_id: Id) -> Option<&Leccion> {
        self.lecciones().find(|l| l.id == leccion_id)
    }

    pub fn first_leccion(&self) -> Option<&Leccion> {
        self.modulos.first()?.lecciones.first()
    }

    pub fn last_leccion(&self) -> Option<&Leccion> {
        self.modulos.last()?.lecciones.last()
    }

    pub fn is_first_or_last(&self, leccion_id: Id) -> bool {
        self.first_leccion().map(|l| l.id) == Some(leccion_id)
            || self.last_leccion().map(|l| l.id) == Some(leccion_id)
    }

    /// Primera lección sin completar, para retomar el curso desde la portada
    pub fn first_incomplete(&self) -> Option<&Leccion> {
        self.lecciones().find(|l| !l.meta.is_completed)
    }

    /// Siguiente lección dentro del módulo o, si es la última, primera del módulo siguiente
    pub fn next_leccion(&self, leccion: &Leccion) -> Option<&Leccion> {
        let index = self.modulos.iter().position(|m| m.id == leccion.modulo_id)?;
        let modulo = &self.modulos[index];
        let pos = modulo.lecciones.iter().position(|l| l.id == leccion.id)?;

        if pos + 1 < modulo.lecciones.len() {
            return modulo.lecciones.get(pos + 1);
        }
        self.modulos.get(index + 1)?.lecciones.first()
    }

    /// Lección anterior, saltando a la última del módulo previo si hace falta
    pub fn prev_leccion(&self, leccion: &Leccion) -> Option<&Leccion> {
        let index = self.modulos.iter().position(|m| m.id == leccion.modulo_id)?;
        let modulo = &self.modulos[index];
        let pos = modulo.lecciones.iter().position(|l| l.id == leccion.id)?;

        if pos > 0 {
            return modulo.lecciones.get(pos - 1);
        }
        self.modulos.get(index.checked_sub(1)?)?.lecciones.last()
    }

    pub fn total_lecciones(&self) -> usize {
        self.lecciones().count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CertificacionMeta {
    #[serde(default)]
    pub iniciada: bool,
    #[serde(default)]
    pub completada: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificacion {
    pub id: Id,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub meta: CertificacionMeta,
}
