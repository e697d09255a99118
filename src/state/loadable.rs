/// Valor con tres estados: aún desconocido, confirmado ausente o cargado.
/// `Absent` es también el centinela de "sesión cerrada", distinto de `Unknown` (cargando).
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Unknown,
    Absent,
    Loaded(T),
}

impl<T> Loadable<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Loadable::Unknown)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Loadable::Loaded(_))
    }

    pub fn as_ref(&self) -> Loadable<&T> {
        match self {
            Loadable::Unknown => Loadable::Unknown,
            Loadable::Absent => Loadable::Absent,
            Loadable::Loaded(value) => Loadable::Loaded(value),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Deriva un valor; `None` mientras no se sepa
    pub fn derive<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> Option<R> {
        match self {
            Loadable::Unknown => None,
            Loadable::Absent => Some(f(None)),
            Loadable::Loaded(value) => Some(f(Some(value))),
        }
    }
}

impl<T> From<Option<T>> for Loadable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Loadable::Loaded(value),
            None => Loadable::Absent,
        }
    }
}
