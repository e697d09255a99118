// ============================================================================
// TESTING - Dobles de prueba compartidos por los tests del crate
// ============================================================================

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::LocalPool;

use crate::error::{CampusError, CampusResult};
use crate::models::{
    Certificacion, Curso, Favorito, Id, Leccion, Progreso, ProgresoGlobal, ProgresoGlobalPatch, ProgresoLecciones,
    ProgresoMeta, Ruta, User, UserPatch,
};
use crate::services::gateway::DataGateway;
use crate::services::notifier::RecordingNotifier;
use crate::services::query::Query;
use crate::utils::runtime::manual::ManualSleeper;
use crate::utils::runtime::Runtime;

#[derive(Default)]
struct FakeData {
    users: HashMap<Id, User>,
    progresos_globales: HashMap<Id, ProgresoGlobal>,
    progresos: Vec<Progreso>,
    favoritos: Vec<Favorito>,
    cursos: Vec<Curso>,
    certificaciones: Vec<Certificacion>,
    rutas: Vec<Ruta>,
    inscripciones: Vec<Id>,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
    gates: HashMap<&'static str, oneshot::Receiver<()>>,
    token: Option<String>,
    next_id: Id,
}

/// API en memoria. Los clones comparten datos.
#[derive(Clone, Default)]
pub struct FakeGateway {
    data: Rc<RefCell<FakeData>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        gateway.data.borrow_mut().next_id = 1000;
        gateway
    }

    /// Registra la llamada y falla si el método está marcado
    fn enter(&self, method: &'static str) -> CampusResult<()> {
        let mut data = self.data.borrow_mut();
        *data.calls.entry(method).or_default() += 1;
        if data.failing.contains(method) {
            return Err(CampusError::Network(format!("{} falló", method)));
        }
        Ok(())
    }

    /// Espera a que el test abra la compuerta de `method`, si la hay
    async fn pass(&self, method: &'static str) {
        let gate = self.data.borrow_mut().gates.remove(method);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    fn next_id(&self) -> Id {
        let mut data = self.data.borrow_mut();
        data.next_id += 1;
        data.next_id
    }

    pub fn calls(&self, method: &str) -> usize {
        self.data.borrow().calls.get(method).copied().unwrap_or(0)
    }

    pub fn fail(&self, method: &'static str) {
        self.data.borrow_mut().failing.insert(method);
    }

    pub fn recover(&self, method: &'static str) {
        self.data.borrow_mut().failing.remove(method);
    }

    /// Retiene la siguiente llamada a `method` hasta que se use el emisor
    pub fn hold(&self, method: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.data.borrow_mut().gates.insert(method, rx);
        tx
    }

    pub fn token(&self) -> Option<String> {
        self.data.borrow().token.clone()
    }

    pub fn seed_user(&self, user: User) {
        if let Some(progreso) = user.progreso_global.clone() {
            self.seed_progreso_global(progreso);
        }
        self.data.borrow_mut().users.insert(user.id, user);
    }

    pub fn seed_progreso_global(&self, progreso: ProgresoGlobal) {
        self.data.borrow_mut().progresos_globales.insert(progreso.id, progreso);
    }

    pub fn seed_progresos(&self, progresos: Vec<Progreso>) {
        self.data.borrow_mut().progresos.extend(progresos);
    }

    pub fn seed_favoritos(&self, favoritos: Vec<Favorito>) {
        self.data.borrow_mut().favoritos.extend(favoritos);
    }

    pub fn seed_cursos(&self, cursos: Vec<Curso>) {
        self.data.borrow_mut().cursos.extend(cursos);
    }

    pub fn seed_certificaciones(&self, certificaciones: Vec<Certificacion>) {
        self.data.borrow_mut().certificaciones.extend(certificaciones);
    }

    pub fn seed_rutas(&self, rutas: Vec<Ruta>) {
        self.data.borrow_mut().rutas.extend(rutas);
    }

    pub fn progresos(&self) -> Vec<Progreso> {
        self.data.borrow().progresos.clone()
    }

    pub fn favoritos(&self) -> Vec<Favorito> {
        self.data.borrow().favoritos.clone()
    }

    /// Procesos en los que se ha inscrito el usuario del token
    pub fn inscripciones(&self) -> Vec<Id> {
        self.data.borrow().inscripciones.clone()
    }

    pub fn progreso_global(&self, id: Id) -> Option<ProgresoGlobal> {
        self.data.borrow().progresos_globales.get(&id).cloned()
    }
}

fn matches_progreso(progreso: &Progreso, query: &Query) -> bool {
    query.pairs().iter().all(|(key, value)| match key.as_str() {
        "user_id" => progreso.user_id.to_string() == *value,
        "leccion_id" => progreso.leccion_id.to_string() == *value,
        "curso_id" => progreso.curso_id.to_string() == *value,
        "modulo_id" => progreso.modulo_id.to_string() == *value,
        "tipo" => progreso.tipo.as_str() == value,
        _ => true,
    })
}

fn matches_user(user_id: Id, query: &Query) -> bool {
    query
        .pairs()
        .iter()
        .all(|(key, value)| key != "user_id" || user_id.to_string() == *value)
}

#[async_trait(?Send)]
impl DataGateway for FakeGateway {
    fn set_token(&self, token: Option<String>) {
        self.data.borrow_mut().token = token;
    }

    async fn get_user_by_id(&self, id: Id) -> CampusResult<Option<User>> {
        self.enter("get_user_by_id")?;
        let data = self.data.borrow();
        let user = data.users.get(&id).cloned().map(|mut user| {
            // El usuario siempre lleva el progreso global vigente
            if let Some(progreso) = user.progreso_global.as_ref() {
                user.progreso_global = data.progresos_globales.get(&progreso.id).cloned();
            }
            user
        });
        Ok(user)
    }

    async fn update_user(&self, id: Id, patch: &UserPatch) -> CampusResult<User> {
        self.enter("update_user")?;
        let mut data = self.data.borrow_mut();
        let user = data
            .users
            .get_mut(&id)
            .ok_or_else(|| CampusError::NotFound(format!("user {}", id)))?;
        if let Some(preferencias) = patch.preferencias.clone() {
            user.preferencias = preferencias;
        }
        Ok(user.clone())
    }

    async fn get_progreso_global_by_id(&self, id: Id) -> CampusResult<Option<ProgresoGlobal>> {
        self.enter("get_progreso_global_by_id")?;
        Ok(self.data.borrow().progresos_globales.get(&id).cloned())
    }

    async fn update_progreso_global(&self, id: Id, patch: &ProgresoGlobalPatch) -> CampusResult<ProgresoGlobal> {
        self.enter("update_progreso_global")?;
        let mut data = self.data.borrow_mut();
        let rutas = data.rutas.clone();
        let progreso = data
            .progresos_globales
            .get_mut(&id)
            .ok_or_else(|| CampusError::NotFound(format!("progreso global {}", id)))?;
        if let Some(ruta_id) = patch.ruta_id {
            progreso.ruta_id = Some(ruta_id);
            progreso.ruta = rutas.into_iter().find(|r| r.id == ruta_id);
        }
        if let Some(lecciones) = patch.progreso_lecciones.clone() {
            progreso.progreso_lecciones = lecciones;
        }
        Ok(progreso.clone())
    }

    async fn get_progresos(&self, query: &Query) -> CampusResult<Vec<Progreso>> {
        self.enter("get_progresos")?;
        Ok(self
            .data
            .borrow()
            .progresos
            .iter()
            .filter(|p| matches_progreso(p, query))
            .cloned()
            .collect())
    }

    async fn add_progreso(&self, progreso: &Progreso) -> CampusResult<Progreso> {
        self.enter("add_progreso")?;
        let created = Progreso { id: Some(self.next_id()), ..progreso.clone() };
        self.data.borrow_mut().progresos.push(created.clone());
        Ok(created)
    }

    async fn get_favoritos(&self, query: &Query) -> CampusResult<Vec<Favorito>> {
        self.enter("get_favoritos")?;
        self.pass("get_favoritos").await;
        Ok(self
            .data
            .borrow()
            .favoritos
            .iter()
            .filter(|f| matches_user(f.user_id, query))
            .cloned()
            .collect())
    }

    async fn add_favorito(&self, favorito: &Favorito) -> CampusResult<Favorito> {
        self.enter("add_favorito")?;
        self.pass("add_favorito").await;
        let created = Favorito { id: Some(self.next_id()), ..favorito.clone() };
        self.data.borrow_mut().favoritos.push(created.clone());
        Ok(created)
    }

    async fn remove_favorito(&self, id: Id) -> CampusResult<()> {
        self.enter("remove_favorito")?;
        self.data.borrow_mut().favoritos.retain(|f| f.id != Some(id));
        Ok(())
    }

    async fn apply_to_proceso(&self, proceso_id: Id) -> CampusResult<()> {
        self.enter("apply_to_proceso")?;
        let mut data = self.data.borrow_mut();
        if !data.inscripciones.contains(&proceso_id) {
            data.inscripciones.push(proceso_id);
        }
        Ok(())
    }

    async fn remove_from_proceso(&self, proceso_id: Id) -> CampusResult<()> {
        self.enter("remove_from_proceso")?;
        self.data.borrow_mut().inscripciones.retain(|id| *id != proceso_id);
        Ok(())
    }

    async fn get_cursos(&self, _query: &Query) -> CampusResult<Vec<Curso>> {
        self.enter("get_cursos")?;
        Ok(self.data.borrow().cursos.clone())
    }

    async fn get_curso(&self, id: Id, _user_id: Option<Id>) -> CampusResult<Option<Curso>> {
        self.enter("get_curso")?;
        Ok(self.data.borrow().cursos.iter().find(|c| c.id == id).cloned())
    }

    async fn get_leccion_by_id(&self, id: Id) -> CampusResult<Option<Leccion>> {
        self.enter("get_leccion_by_id")?;
        let data = self.data.borrow();
        let leccion = data
            .cursos
            .iter()
            .flat_map(|c| c.modulos.iter())
            .flat_map(|m| m.lecciones.iter())
            .find(|l| l.id == id)
            .cloned();
        Ok(leccion)
    }

    async fn get_certificaciones(&self, _query: &Query) -> CampusResult<Vec<Certificacion>> {
        self.enter("get_certificaciones")?;
        Ok(self.data.borrow().certificaciones.clone())
    }

    async fn get_rutas(&self, _query: &Query) -> CampusResult<Vec<Ruta>> {
        self.enter("get_rutas")?;
        Ok(self.data.borrow().rutas.clone())
    }
}

/// Pool local, reloj manual, API falsa y notifier que graba
pub struct TestEnv {
    pub pool: LocalPool,
    pub sleeper: ManualSleeper,
    pub runtime: Runtime,
    pub gateway: FakeGateway,
    pub notifier: RecordingNotifier,
}

impl TestEnv {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let sleeper = ManualSleeper::default();
        let runtime = Runtime::new(Rc::new(pool.spawner()), Rc::new(sleeper.clone()));
        Self {
            pool,
            sleeper,
            runtime,
            gateway: FakeGateway::new(),
            notifier: RecordingNotifier::new(),
        }
    }

    pub fn data_gateway(&self) -> Rc<dyn DataGateway> {
        Rc::new(self.gateway.clone())
    }
}

pub fn progreso_global(id: Id, ruta_id: Option<Id>) -> ProgresoGlobal {
    ProgresoGlobal {
        id,
        ruta_id,
        ruta: None,
        progreso_lecciones: ProgresoLecciones::default(),
        meta: ProgresoMeta::default(),
    }
}

pub fn user(id: Id, progreso_id: Option<Id>) -> User {
    User {
        id,
        email: format!("alumno{}@campus.dev", id),
        nombre: Some(format!("Alumno {}", id)),
        progreso_global: progreso_id.map(|p| progreso_global(p, Some(1))),
        preferencias: Default::default(),
        procesos: Vec::new(),
    }
}
