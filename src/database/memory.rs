//! In-memory repositories. State lives for the process lifetime.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Consulta, ConsultaRepository, ConsultaStatus, StoreError, UserRecord, UserRepository};

#[derive(Default)]
struct UserTables {
    by_id: HashMap<Uuid, UserRecord>,
    by_email: HashMap<String, Uuid>,
    by_cpf: HashMap<String, Uuid>,
}

/// User store with e-mail and CPF indexes kept under one lock, so the
/// uniqueness checks and the insert are atomic.
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<UserTables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write();
        if tables.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if tables.by_cpf.contains_key(&user.cpf) {
            return Err(StoreError::DuplicateCpf);
        }

        tables.by_email.insert(user.email.clone(), user.id);
        tables.by_cpf.insert(user.cpf.clone(), user.id);
        tables.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Option<UserRecord> {
        self.tables.read().by_id.get(&id).cloned()
    }

    async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let tables = self.tables.read();
        tables
            .by_email
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned()
    }

    async fn find_by_cpf(&self, cpf: &str) -> Option<UserRecord> {
        let tables = self.tables.read();
        tables
            .by_cpf
            .get(cpf)
            .and_then(|id| tables.by_id.get(id))
            .cloned()
    }
}

#[derive(Default)]
pub struct MemoryConsultaStore {
    consultas: DashMap<Uuid, Consulta>,
}

impl MemoryConsultaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsultaRepository for MemoryConsultaStore {
    async fn insert(&self, consulta: Consulta) -> Consulta {
        self.consultas.insert(consulta.id, consulta.clone());
        consulta
    }

    async fn get(&self, id: Uuid) -> Option<Consulta> {
        self.consultas.get(&id).map(|entry| entry.value().clone())
    }

    async fn list(&self, patient_id: Option<Uuid>) -> Vec<Consulta> {
        let mut consultas: Vec<Consulta> = self
            .consultas
            .iter()
            .filter(|entry| patient_id.is_none_or(|id| entry.patient_id == id))
            .map(|entry| entry.value().clone())
            .collect();
        consultas.sort_by_key(|c| c.scheduled_at);
        consultas
    }

    async fn update_status(&self, id: Uuid, status: ConsultaStatus) -> Result<Consulta, StoreError> {
        let mut entry = self.consultas.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !entry.status.can_become(status) {
            let reason = match entry.status {
                ConsultaStatus::Cancelada => "Consulta já cancelada",
                ConsultaStatus::Concluida => "Consulta já concluída",
                ConsultaStatus::Agendada => "Consulta já agendada",
            };
            return Err(StoreError::InvalidTransition(reason.to_string()));
        }
        entry.status = status;
        Ok(entry.clone())
    }
}
