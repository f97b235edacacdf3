use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::backend::SimulationBackend;
use crate::errors::AppError;
use crate::models::{AuthUser, NewSimulation, Session, SimulationRecord};

struct Account {
    password: String,
    user: AuthUser,
    roles: Vec<String>,
}

#[derive(Default)]
struct State {
    records: Vec<SimulationRecord>,
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, AuthUser>,
    fail_writes: bool,
    fail_reads: bool,
    fail_role_lookups: bool,
    inserts: usize,
    sign_outs: usize,
}

/// In-process stand-in for the hosted backend.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, email: &str, password: &str, roles: &[&str]) -> Self {
        self.add_user(email, password, roles);
        self
    }

    /// Registers an account and returns its user id.
    pub fn add_user(&self, email: &str, password: &str, roles: &[&str]) -> String {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        let id = user.id.clone();
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user,
                roles: roles.iter().map(|r| r.to_string()).collect(),
            },
        );
        id
    }

    /// Seeds a record directly, bypassing the form.
    pub fn seed(&self, record: NewSimulation, created_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().records.push(to_record(id, created_at, record));
        id
    }

    /// Opens a session without a password round-trip.
    pub fn open_session(&self, email: &str) -> Option<String> {
        let mut state = self.lock();
        let user = state.accounts.get(email)?.user.clone();
        let token = Uuid::new_v4().to_string();
        state.sessions.insert(token.clone(), user);
        Some(token)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Makes listing simulations fail.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Makes the role lookup fail while sign-in keeps working.
    pub fn fail_role_lookups(&self, fail: bool) {
        self.lock().fail_role_lookups = fail;
    }

    pub fn records(&self) -> Vec<SimulationRecord> {
        self.lock().records.clone()
    }

    pub fn insert_count(&self) -> usize {
        self.lock().inserts
    }

    pub fn sign_out_count(&self) -> usize {
        self.lock().sign_outs
    }

    pub fn is_session_active(&self, token: &str) -> bool {
        self.lock().sessions.contains_key(token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn to_record(id: Uuid, created_at: DateTime<Utc>, new: NewSimulation) -> SimulationRecord {
    SimulationRecord {
        id,
        created_at,
        nome: new.nome,
        contato: new.contato,
        ano: new.ano,
        marca: new.marca,
        modelo: new.modelo,
        placa: new.placa,
        plano_selecionado: new.plano_selecionado,
        parceiras_selecionadas: Some(new.parceiras_selecionadas),
    }
}

#[async_trait]
impl SimulationBackend for InMemoryBackend {
    async fn insert_simulation(&self, record: &NewSimulation) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(AppError::RemoteWrite("simulated write failure".to_string()));
        }
        state.inserts += 1;
        state
            .records
            .push(to_record(Uuid::new_v4(), Utc::now(), record.clone()));
        Ok(())
    }

    async fn list_simulations(
        &self,
        access_token: &str,
    ) -> Result<Vec<SimulationRecord>, AppError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(AppError::RemoteRead("simulated read failure".to_string()));
        }
        if !state.sessions.contains_key(access_token) {
            return Err(AppError::RemoteRead("permission denied".to_string()));
        }
        let mut records = state.records.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn fetch_roles(&self, user_id: &str, _access_token: &str) -> Result<Vec<String>, AppError> {
        let state = self.lock();
        if state.fail_role_lookups {
            return Err(AppError::RemoteRead("simulated role lookup failure".to_string()));
        }
        Ok(state
            .accounts
            .values()
            .find(|a| a.user.id == user_id)
            .map(|a| a.roles.clone())
            .unwrap_or_default())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let mut state = self.lock();
        let user = match state.accounts.get(email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AppError::Auth("Invalid login credentials".to_string())),
        };
        let token = Uuid::new_v4().to_string();
        state.sessions.insert(token.clone(), user.clone());
        Ok(Session {
            access_token: token,
            refresh_token: Uuid::new_v4().to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user,
        })
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        Ok(self.lock().sessions.get(access_token).cloned())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        state.sign_outs += 1;
        state.sessions.remove(access_token);
        Ok(())
    }
}
