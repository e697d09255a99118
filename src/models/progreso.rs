// ============================================================================
// PROGRESO - Progreso global del alumno y registros por lección
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Id, Ruta};

/// Segundos vistos por lección más la última lección reproducida.
/// En el JSON ambos conviven en el mismo objeto: `{"42": 130.5, "lastPlayed": 42}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ProgresoLecciones {
    #[serde(rename = "lastPlayed", default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<Id>,
    #[serde(flatten)]
    pub segundos: BTreeMap<String, f64>,
}

impl ProgresoLecciones {
    pub fn segundos_de(&self, leccion_id: Id) -> Option<f64> {
        self.segundos.get(&leccion_id.to_string()).copied()
    }

    /// Guarda la posición y marca la lección como la última reproducida
    pub fn registrar(&mut self, leccion_id: Id, segundos: f64) {
        self.segundos.insert(leccion_id.to_string(), segundos);
        self.last_played = Some(leccion_id);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgresoMeta {
    #[serde(default)]
    pub certificaciones_completadas: Vec<Id>,
    #[serde(default)]
    pub certificaciones_iniciadas: Vec<Id>,
    /// Porcentaje de cursos completados de la ruta
    #[serde(default)]
    pub progreso_cursos: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgresoGlobal {
    pub id: Id,
    #[serde(default)]
    pub ruta_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruta: Option<Ruta>,
    #[serde(default)]
    pub progreso_lecciones: ProgresoLecciones,
    #[serde(default)]
    pub meta: ProgresoMeta,
}

impl ProgresoGlobal {
    pub fn is_certificacion_completada(&self, certificacion_id: Id) -> bool {
        self.meta.certificaciones_completadas.contains(&certificacion_id)
    }

    pub fn is_certificacion_iniciada(&self, certificacion_id: Id) -> bool {
        self.meta.certificaciones_iniciadas.contains(&certificacion_id)
    }
}

/// Cuerpo parcial para `update_progreso_global`. Solo se envían los campos presentes.
#[derive(Clone, Debug, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgresoGlobalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruta_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progreso_lecciones: Option<ProgresoLecciones>,
}

impl ProgresoGlobalPatch {
    pub fn ruta(ruta_id: Id) -> Self {
        Self { ruta_id: Some(ruta_id), ..Default::default() }
    }

    pub fn lecciones(progreso_lecciones: ProgresoLecciones) -> Self {
        Self { progreso_lecciones: Some(progreso_lecciones), ..Default::default() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgresoTipo {
    Visto,
    Completado,
}

impl ProgresoTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgresoTipo::Visto => "visto",
            ProgresoTipo::Completado => "completado",
        }
    }
}

/// Registro de evento por lección (vista / completada)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progreso {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub user_id: Id,
    pub curso_id: Id,
    pub leccion_id: Id,
    pub modulo_id: Id,
    pub tipo: ProgresoTipo,
}
