//! # Database Module
//!
//! Repository traits for users and appointments plus the in-memory
//! stores the server runs on. Handlers only see the traits, so a
//! persistent backend can replace the stores without touching routes.

pub mod memory;
pub mod models;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::{MemoryConsultaStore, MemoryUserStore};
pub use models::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("E-mail já cadastrado")]
    DuplicateEmail,

    #[error("CPF já cadastrado")]
    DuplicateCpf,

    #[error("Registro não encontrado")]
    NotFound,

    #[error("{0}")]
    InvalidTransition(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. E-mail and CPF must both be unused.
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Option<UserRecord>;
    async fn find_by_email(&self, email: &str) -> Option<UserRecord>;
    async fn find_by_cpf(&self, cpf: &str) -> Option<UserRecord>;
}

#[async_trait]
pub trait ConsultaRepository: Send + Sync {
    async fn insert(&self, consulta: Consulta) -> Consulta;
    async fn get(&self, id: Uuid) -> Option<Consulta>;

    /// All appointments, or only `patient_id`'s, ordered by `scheduled_at`.
    async fn list(&self, patient_id: Option<Uuid>) -> Vec<Consulta>;

    async fn update_status(&self, id: Uuid, status: ConsultaStatus) -> Result<Consulta, StoreError>;
}
