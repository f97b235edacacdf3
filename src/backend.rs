//! Data-access interface to the hosted backend.
//!
//! Every component receives an `Arc<dyn SimulationBackend>` at construction
//! instead of reaching for a global client, so tests can swap in
//! [`crate::memory_backend::InMemoryBackend`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{AuthUser, NewSimulation, Session, SimulationRecord};

#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// Inserts one simulation. Called once per form submission.
    async fn insert_simulation(&self, record: &NewSimulation) -> Result<(), AppError>;

    /// Lists every simulation, newest first.
    async fn list_simulations(&self, access_token: &str)
        -> Result<Vec<SimulationRecord>, AppError>;

    /// Role names assigned to a user.
    async fn fetch_roles(&self, user_id: &str, access_token: &str)
        -> Result<Vec<String>, AppError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AppError>;

    /// Resolves the user behind an access token; `None` when the token is
    /// missing, expired or revoked.
    async fn get_session(&self, access_token: &str) -> Result<Option<AuthUser>, AppError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

pub type SharedBackend = Arc<dyn SimulationBackend>;
