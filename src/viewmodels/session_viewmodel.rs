// ============================================================================
// SESSION VIEWMODEL - LÓGICA DE SESIÓN
// ============================================================================
// Login, logout, restauración al arrancar e hidratación de los stores.
// La hidratación ocurre una sola vez por login (flag `first_load`).
// ============================================================================

use std::collections::HashSet;
use std::rc::Rc;

use crate::config::{CampusPage, CONFIG};
use crate::error::{CampusError, CampusResult};
use crate::models::{
    Credentials, Id, LoginData, Preferencias, Proceso, ProcesoInscripcion, ProgresoGlobal, ProgresoGlobalPatch, Ruta,
    ThemeMode, User, UserPatch,
};
use crate::services::catalog_service::CatalogService;
use crate::services::gateway::DataGateway;
use crate::services::notifier::{Notifier, Toast, LONG_TOAST_MS};
use crate::services::query::Query;
use crate::state::AppState;
use crate::utils::storage::SessionStorage;

/// ViewModel de sesión - SOLO lógica de negocio
#[derive(Clone)]
pub struct SessionViewModel {
    state: AppState,
    gateway: Rc<dyn DataGateway>,
    storage: SessionStorage,
    catalog: CatalogService,
    notifier: Rc<dyn Notifier>,
    disabled_pages: HashSet<CampusPage>,
}

impl SessionViewModel {
    pub fn new(
        state: AppState,
        gateway: Rc<dyn DataGateway>,
        storage: SessionStorage,
        catalog: CatalogService,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            state,
            gateway,
            storage,
            catalog,
            notifier,
            disabled_pages: CONFIG.disabled_pages(),
        }
    }

    pub fn with_disabled_pages(mut self, pages: HashSet<CampusPage>) -> Self {
        self.disabled_pages = pages;
        self
    }

    /// Login con el token del formulario (o del storage)
    pub async fn login(&self, credentials: Credentials, user_id: Option<Id>, persist: bool) -> CampusResult<User> {
        if credentials.token.is_empty() {
            return Err(CampusError::Auth("Token ausente".to_string()));
        }
        let Some(user_id) = user_id else {
            return Err(CampusError::Auth("Usuario ausente".to_string()));
        };

        log::info!("🔐 Iniciando sesión del usuario {}...", user_id);
        self.state.session.set_loading(true);
        self.gateway.set_token(Some(credentials.token.clone()));

        let user = match self.gateway.get_user_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(self.reject(format!("Usuario {} no encontrado", user_id))),
            Err(e) => return Err(self.reject(e.to_string())),
        };

        // Cambio de usuario sin logout: nada del anterior debe sobrevivir
        if let Some(previous) = self.state.session.get_user_id().filter(|id| *id != user.id) {
            log::info!("🔁 Cambio de usuario {} -> {}", previous, user.id);
            self.state.tear_down();
            self.catalog.clear();
        }

        let data = LoginData {
            token: credentials.token.clone(),
            user: user.clone(),
        };
        if let Err(e) = self.storage.save(&data, persist) {
            log::error!("❌ Error guardando sesión: {}", e);
        }
        self.state.session.set_session(credentials.token, user.clone());
        self.state.session.set_loading(false);
        self.state.session.set_error(None);
        log::info!("✅ Sesión iniciada: {}", user.email);

        if self.state.session.get_first_load() {
            self.hydrate(&user).await;
        }
        Ok(user)
    }

    /// Fallo de autenticación: sesión cerrada y aviso largo
    fn reject(&self, message: String) -> CampusError {
        log::error!("❌ Login rechazado: {}", message);
        self.logout();
        self.state.session.set_error(Some(message.clone()));
        self.notifier.notify(
            Toast::error("Error de autenticación", message.clone()).with_duration(LONG_TOAST_MS),
        );
        CampusError::Auth(message)
    }

    async fn hydrate(&self, user: &User) {
        log::info!("💧 Hidratando estado del usuario {}", user.id);
        self.state.ui.set_theme(user.theme());
        self.state.ui.set_disabled_pages(self.disabled_pages.clone());
        self.apply_progreso(user).await;

        if let Err(e) = self.state.favoritos.load(user.id).await {
            log::error!("❌ Error cargando favoritos: {}", e);
        }
        self.catalog.prefetch();

        // Un logout (u otro login) durante la hidratación deja `first_load` armado
        if self.state.session.get_user_id() == Some(user.id) {
            self.state.session.set_first_load(false);
            log::info!("✅ Hidratación completada");
        }
    }

    async fn apply_progreso(&self, user: &User) {
        self.state.progreso.set_progreso_global(user.progreso_global.clone());
        let ruta = self.resolve_ruta(user.progreso_global.as_ref()).await;
        self.state.ruta.set_ruta(ruta);
    }

    async fn resolve_ruta(&self, progreso: Option<&ProgresoGlobal>) -> Option<Ruta> {
        let progreso = progreso?;
        if let Some(ruta) = progreso.ruta.clone() {
            return Some(ruta);
        }
        let ruta_id = progreso.ruta_id?;
        match self.gateway.get_rutas(&Query::new().eq("id", ruta_id)).await {
            Ok(rutas) => rutas.into_iter().find(|r| r.id == ruta_id),
            Err(e) => {
                log::error!("❌ Error cargando la ruta {}: {}", ruta_id, e);
                None
            }
        }
    }

    /// Cierra la sesión. Nunca falla y se puede llamar varias veces.
    pub fn logout(&self) {
        self.gateway.set_token(None);
        self.storage.clear();
        self.state.tear_down();
        self.catalog.clear();
        log::info!("👋 Sesión cerrada");
    }

    /// Login silencioso con la sesión persistida. `Ok(None)` si no hay ninguna.
    pub async fn restore(&self) -> CampusResult<Option<User>> {
        let Some((data, persist)) = self.storage.load() else {
            log::debug!("Sin sesión persistida");
            return Ok(None);
        };
        log::info!("🔄 Restaurando sesión persistida");
        match self.login(Credentials::new(data.token), Some(data.user.id), persist).await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                self.logout();
                Err(e)
            }
        }
    }

    async fn refetch_user(&self, user_id: Id) -> CampusResult<User> {
        let user = self
            .gateway
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| CampusError::NotFound(format!("user {}", user_id)))?;
        self.state.session.set_user(user.clone());
        Ok(user)
    }

    fn current_user_id(&self) -> CampusResult<Id> {
        self.state
            .session
            .get_user_id()
            .ok_or_else(|| CampusError::Auth("Sin sesión".to_string()))
    }

    /// Cambio de hoja de ruta confirmado por el servidor
    pub async fn change_ruta(&self, ruta_id: Id) -> CampusResult<()> {
        let Some(progreso_id) = self.state.progreso.id() else {
            self.notifier.notify(Toast::warning(
                "Error al cambiar de ruta",
                "No se ha encontrado tu progreso. Actualice la página y contacte con soporte si el error persiste.",
            ));
            return Err(CampusError::UndefinedEntity("progreso global".to_string()));
        };
        let user_id = self.current_user_id()?;

        let gateway = self.gateway.clone();
        self.state
            .progreso
            .commit(async move {
                gateway
                    .update_progreso_global(progreso_id, &ProgresoGlobalPatch::ruta(ruta_id))
                    .await
                    .map(Some)
            })
            .await?;

        let user = self.refetch_user(user_id).await?;
        self.apply_progreso(&user).await;
        log::info!("🗺️ Ruta cambiada a {}", ruta_id);
        Ok(())
    }

    // ========================================================================
    // PROCESOS DE SELECCIÓN
    // ========================================================================

    /// Inscripción confirmada por el servidor; después se añade al usuario local
    pub async fn apply_to_proceso(&self, proceso: &Proceso) -> CampusResult<User> {
        self.current_user_id()?;
        if let Err(e) = self.gateway.apply_to_proceso(proceso.id).await {
            return Err(self.proceso_failed(e));
        }
        let user = self.edit_user(|user| {
            if !user.is_inscrito(proceso.id) {
                user.procesos.push(ProcesoInscripcion {
                    id: proceso.id,
                    titulo: proceso.titulo.clone(),
                    estado: None,
                });
            }
        })?;
        log::info!("✅ Inscrito en el proceso {}", proceso.id);
        Ok(user)
    }

    pub async fn remove_from_proceso(&self, proceso_id: Id) -> CampusResult<User> {
        self.current_user_id()?;
        if let Err(e) = self.gateway.remove_from_proceso(proceso_id).await {
            return Err(self.proceso_failed(e));
        }
        let user = self.edit_user(|user| user.procesos.retain(|p| p.id != proceso_id))?;
        log::info!("✅ Baja del proceso {}", proceso_id);
        Ok(user)
    }

    /// Adopta la hoja de ruta del proceso. `Ok(false)` si el proceso no tiene ruta.
    pub async fn follow_proceso_ruta(&self, proceso: &Proceso) -> CampusResult<bool> {
        let Some(ruta_id) = proceso.ruta_id else {
            log::debug!("Proceso {} sin hoja de ruta", proceso.id);
            return Ok(false);
        };
        self.change_ruta(ruta_id).await?;
        self.notifier
            .notify(Toast::info("Hoja de ruta", "Se ha actualizado la hoja de ruta"));
        Ok(true)
    }

    fn proceso_failed(&self, error: CampusError) -> CampusError {
        log::error!("❌ Error en la solicitud del proceso: {}", error);
        self.notifier
            .notify(Toast::error("Error interno", "No se ha podido procesar la solicitud"));
        error
    }

    /// Modifica el usuario de la sesión en el momento de aplicar el cambio
    fn edit_user(&self, edit: impl FnOnce(&mut User)) -> CampusResult<User> {
        let mut user = self
            .state
            .session
            .get_user()
            .ok_or_else(|| CampusError::Auth("Sin sesión".to_string()))?;
        edit(&mut user);
        self.state.session.set_user(user.clone());
        Ok(user)
    }

    pub async fn update_preferencias(&self, preferencias: Preferencias) -> CampusResult<User> {
        let user_id = self.current_user_id()?;
        let patch = UserPatch {
            preferencias: Some(preferencias),
        };
        self.gateway.update_user(user_id, &patch).await?;
        let user = self.refetch_user(user_id).await?;
        self.state.ui.set_theme(user.theme());
        Ok(user)
    }

    pub async fn set_theme(&self, theme: ThemeMode) -> CampusResult<User> {
        let mut preferencias = self.current_preferencias()?;
        preferencias.tema = Some(theme);
        self.update_preferencias(preferencias).await
    }

    /// Oculta el widget de Discord para siempre
    pub async fn hide_discord(&self) -> CampusResult<User> {
        let mut preferencias = self.current_preferencias()?;
        preferencias.show_discord = Some(false);
        self.update_preferencias(preferencias).await
    }

    fn current_preferencias(&self) -> CampusResult<Preferencias> {
        self.state
            .session
            .get_user()
            .map(|u| u.preferencias)
            .ok_or_else(|| CampusError::Auth("Sin sesión".to_string()))
    }
}
