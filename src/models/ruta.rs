use serde::{Deserialize, Serialize};

use super::{Curso, Id};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct RutaMeta {
    #[serde(default)]
    pub itinerario: Vec<Id>,
}

/// Hoja de ruta del alumno. `meta.itinerario` es la lista ordenada de cursos.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruta {
    pub id: Id,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub itinerario: String,
    #[serde(default)]
    pub privada: Option<bool>,
    #[serde(default)]
    pub meta: RutaMeta,
}

/// Cursos del itinerario en el orden de la ruta. Ids sin curso cargado se omiten.
pub fn filter_cursos_by_ruta(itinerario: &[Id], cursos: &[Curso]) -> Vec<Curso> {
    itinerario
        .iter()
        .filter_map(|id| cursos.iter().find(|c| c.id == *id))
        .cloned()
        .collect()
}

/// Cursos que no forman parte del itinerario, en su orden original
pub fn cursos_fuera_de_ruta(itinerario: &[Id], cursos: &[Curso]) -> Vec<Curso> {
    cursos
        .iter()
        .filter(|c| !itinerario.contains(&c.id))
        .cloned()
        .collect()
}
