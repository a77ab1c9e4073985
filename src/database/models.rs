// Database Models
//
// Records kept by the repositories. `UserRecord` never leaves the server;
// handlers expose it through `AuthUser`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::models::{AuthUser, UserType};

/// Registered user account
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    /// Lowercased
    pub email: String,
    /// Digits only
    pub cpf: String,
    pub name: String,
    pub user_type: UserType,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.to_string(),
            email: Some(self.email.clone()),
            user_type: self.user_type,
            name: Some(self.name.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultaStatus {
    Agendada,
    Cancelada,
    Concluida,
}

impl ConsultaStatus {
    /// Only scheduled appointments may move; cancelled and concluded are final.
    pub fn can_become(&self, next: ConsultaStatus) -> bool {
        matches!(self, Self::Agendada) && next != Self::Agendada
    }
}

/// Medical appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consulta {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_name: Option<String>,
    pub specialty: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: ConsultaStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/consultas`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConsulta {
    pub specialty: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}
