// ============================================================================
// QUERY - Filtros ordenados de clave única
// ============================================================================
// Una query es una secuencia de filtros `{clave: valor}`. Se admiten claves
// repetidas (p.ej. dos cotas sobre el mismo campo) y valores indefinidos,
// que indican que un parámetro dependiente aún no está resuelto.
// ============================================================================

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// Los parámetros indefinidos se omiten de la petición
    #[default]
    Default,
    /// Cualquier parámetro indefinido deja la consulta "no lista": no hay petición
    InvalidateOnUndefined,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub key: String,
    /// `None` = indefinido
    pub value: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Query {
    filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añade un filtro definido
    pub fn eq(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { key: key.to_string(), value: Some(value.into()) });
        self
    }

    /// Añade un filtro que puede estar aún sin resolver
    pub fn maybe<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        self.filters.push(Filter { key: key.to_string(), value: value.map(Into::into) });
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn has_undefined(&self) -> bool {
        self.filters.iter().any(|f| f.value.is_none())
    }

    /// Copia sin los filtros indefinidos
    pub fn defined(&self) -> Query {
        Query {
            filters: self.filters.iter().filter(|f| f.value.is_some()).cloned().collect(),
        }
    }

    /// Serialización estable: `[{"user_id":7},{"tipo":"visto"}]`
    pub fn fingerprint(&self) -> String {
        let parts: Vec<Value> = self
            .filters
            .iter()
            .map(|f| {
                let mut entry = serde_json::Map::new();
                entry.insert(f.key.clone(), f.value.clone().unwrap_or(Value::Null));
                Value::Object(entry)
            })
            .collect();
        Value::Array(parts).to_string()
    }

    /// Pares `(clave, valor)` en orden, sin los indefinidos
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .filter_map(|f| Some((f.key.clone(), render_value(f.value.as_ref()?))))
            .collect()
    }

    /// `&clave=valor` por cada filtro definido, respetando el orden
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(key, value)| format!("&{}={}", key, value))
            .collect()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
