// ============================================================================
// FAVORITOS STATE - Marcadores con actualización optimista
// ============================================================================
// Las mutaciones modifican la lista local al instante y se reconcilian con el
// servidor en segundo plano. No hay rollback: un fallo solo se registra en el
// log y la siguiente carga completa corrige la lista.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::error::CampusResult;
use crate::models::{Favorito, FavoritoTipo, Id};
use crate::services::gateway::DataGateway;
use crate::services::query::Query;
use crate::state::{Loadable, ReactiveState};
use crate::utils::runtime::Runtime;

#[derive(Clone)]
pub struct FavoritosState {
    favoritos: ReactiveState<Loadable<Vec<Favorito>>>,
    gateway: Rc<dyn DataGateway>,
    runtime: Runtime,
    generation: Rc<Cell<u64>>,
}

impl FavoritosState {
    pub fn new(gateway: Rc<dyn DataGateway>, runtime: Runtime) -> Self {
        Self {
            favoritos: ReactiveState::new(Loadable::Unknown),
            gateway,
            runtime,
            generation: Rc::new(Cell::new(0)),
        }
    }

    pub fn get(&self) -> Loadable<Vec<Favorito>> {
        self.favoritos.get()
    }

    /// Lista actual; vacía mientras no haya cargado
    pub fn favoritos(&self) -> Vec<Favorito> {
        self.favoritos.with(|f| f.loaded().cloned().unwrap_or_default())
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.favoritos.subscribe(callback);
    }

    /// Carga completa de la lista del usuario. Una carga posterior (o un logout)
    /// invalida el resultado de esta.
    pub async fn load(&self, user_id: Id) -> CampusResult<()> {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let query = Query::new().eq("user_id", user_id);
        let favoritos = self.gateway.get_favoritos(&query).await?;

        if self.generation.get() != generation {
            log::debug!("Carga de favoritos obsoleta descartada");
            return Ok(());
        }
        log::info!("⭐ {} favoritos cargados", favoritos.len());
        self.favoritos.update(|state| {
            // Los añadidos aún sin confirmar sobreviven a la carga
            let pending: Vec<Favorito> = state
                .loaded()
                .map(|list| {
                    list.iter()
                        .filter(|f| f.id.is_none() && !favoritos.iter().any(|s| s.same_target(f)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            let mut merged = favoritos;
            merged.extend(pending);
            *state = Loadable::Loaded(merged);
        });
        Ok(())
    }

    /// Centinela de sesión cerrada
    pub fn reset(&self) {
        self.generation.set(self.generation.get() + 1);
        self.favoritos.set(Loadable::Absent);
    }

    pub fn find(&self, tipo: FavoritoTipo, objeto_id: Id) -> Option<Favorito> {
        self.favoritos.with(|f| {
            f.loaded()?
                .iter()
                .find(|f| f.tipo == tipo && f.objeto_id == objeto_id)
                .cloned()
        })
    }

    pub fn is_favorito(&self, tipo: FavoritoTipo, objeto_id: Id) -> bool {
        self.find(tipo, objeto_id).is_some()
    }

    /// Búsqueda sin distinguir mayúsculas sobre el título del objeto embebido
    pub fn filter_favoritos(&self, query: &str) -> Vec<Favorito> {
        let query = query.trim().to_lowercase();
        let favoritos = self.favoritos();
        if query.is_empty() {
            return favoritos;
        }
        favoritos
            .into_iter()
            .filter(|f| f.titulo().is_some_and(|t| t.to_lowercase().contains(&query)))
            .collect()
    }

    /// Añade al instante y confirma en segundo plano. Duplicados no hacen nada.
    pub fn add_favorito(&self, favorito: Favorito) {
        let mut duplicated = false;
        self.favoritos.update(|state| {
            if !state.is_loaded() {
                *state = Loadable::Loaded(Vec::new());
            }
            if let Loadable::Loaded(list) = state {
                if list.iter().any(|f| f.same_target(&favorito)) {
                    duplicated = true;
                } else {
                    list.push(Favorito { id: None, ..favorito.clone() });
                }
            }
        });

        if duplicated {
            log::debug!("Favorito {:?} {} ya existe", favorito.tipo, favorito.objeto_id);
            return;
        }

        let this = self.clone();
        self.runtime.spawn(async move { this.confirm_add(favorito).await });
    }

    async fn confirm_add(&self, favorito: Favorito) {
        let created = match self.gateway.add_favorito(&favorito.without_objeto()).await {
            Ok(created) => created,
            Err(e) => {
                log::error!("❌ Error al añadir favorito: {}", e);
                return;
            }
        };
        let Some(id) = created.id else {
            log::warn!("⚠️ El servidor no devolvió id para el favorito");
            return;
        };

        let mut present = false;
        self.favoritos.update(|state| {
            if let Loadable::Loaded(list) = state {
                if let Some(local) = list.iter_mut().find(|f| f.same_target(&favorito)) {
                    // Una carga completa puede haber traído ya la entrada con su id
                    if local.id.is_none() {
                        local.id = Some(id);
                    }
                    present = true;
                }
            }
        });

        // Se quitó mientras se creaba: se borra también en el servidor
        if !present {
            log::debug!("Favorito {} quitado antes de confirmarse, se elimina", id);
            if let Err(e) = self.gateway.remove_favorito(id).await {
                log::error!("❌ Error al eliminar favorito: {}", e);
            }
        }
    }

    /// Quita al instante; si ya tenía id se borra en segundo plano
    pub fn remove_favorito(&self, favorito: &Favorito) {
        let mut removed: Vec<Favorito> = Vec::new();
        self.favoritos.update(|state| {
            if let Loadable::Loaded(list) = state {
                let (out, keep): (Vec<_>, Vec<_>) = list.drain(..).partition(|f| f.same_target(favorito));
                *list = keep;
                removed = out;
            }
        });

        for id in removed.into_iter().filter_map(|f| f.id) {
            let gateway = self.gateway.clone();
            self.runtime.spawn(async move {
                if let Err(e) = gateway.remove_favorito(id).await {
                    log::error!("❌ Error al eliminar favorito {}: {}", id, e);
                }
            });
        }
    }
}
