//! Authentication Models
//!
//! Data structures for authentication requests, responses, and user information.
//! The same types travel over the wire in both directions: the server
//! produces them and the API client consumes them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role a user registers with; gates which screens and records they see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Paciente,
    Medico,
    Gestor,
    Recepcionista,
    Estoque,
    Farmacia,
}

impl UserType {
    pub const ALL: [UserType; 6] = [
        Self::Paciente,
        Self::Medico,
        Self::Gestor,
        Self::Recepcionista,
        Self::Estoque,
        Self::Farmacia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paciente => "paciente",
            Self::Medico => "medico",
            Self::Gestor => "gestor",
            Self::Recepcionista => "recepcionista",
            Self::Estoque => "estoque",
            Self::Farmacia => "farmacia",
        }
    }

    /// Roles that may see every patient's appointments.
    pub fn sees_all_consultas(&self) -> bool {
        matches!(self, Self::Medico | Self::Gestor | Self::Recepcionista)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("tipo de usuário desconhecido: {s}"))
    }
}

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Login request payload. `identifier` is an e-mail or a CPF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    pub user_type: UserType,
}

/// Sign-up request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub cpf: String,
    pub name: String,
    pub user_type: UserType,
}

/// Returned by login and sign-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: AuthUser,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}
