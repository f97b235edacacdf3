use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Stored Records ============

/// One submitted quote request, as read back from the simulations table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub nome: String,
    pub contato: String,
    pub ano: String,
    pub marca: String,
    pub modelo: String,
    /// Stored upper-cased.
    pub placa: String,
    /// One plan id, or several joined with `", "`.
    pub plano_selecionado: String,
    /// Null in rows written before partners existed.
    pub parceiras_selecionadas: Option<Vec<String>>,
}

impl SimulationRecord {
    pub fn partners(&self) -> &[String] {
        self.parceiras_selecionadas.as_deref().unwrap_or(&[])
    }
}

/// Row shape written on form submission. Id and timestamp are assigned by
/// the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSimulation {
    pub nome: String,
    pub contato: String,
    pub ano: String,
    pub marca: String,
    pub modelo: String,
    pub placa: String,
    pub plano_selecionado: String,
    pub parceiras_selecionadas: Vec<String>,
}

/// Row of the roles table.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRow {
    pub role: String,
}

// ============ Auth ============

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session returned by a successful password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub redirect: String,
    #[serde(flatten)]
    pub session: Session,
}

// ============ Quote Form ============

/// Body of a quote form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub contato: String,
    #[serde(default)]
    pub ano: String,
    #[serde(default)]
    pub marca: String,
    #[serde(default)]
    pub modelo: String,
    #[serde(default)]
    pub placa: String,
    #[serde(default)]
    pub planos: Vec<String>,
    #[serde(default)]
    pub parceiras: Vec<String>,
}

/// Summary carried to the confirmation view after a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThankYouSummary {
    pub nome: String,
    pub contato: String,
    /// `"marca modelo (ano)"`
    pub veiculo: String,
    pub placa: String,
    /// Display names of the chosen plans.
    pub planos: Vec<String>,
    pub parceiras: Vec<String>,
    pub mensagem: String,
}

// ============ Dashboard ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankEntry {
    pub nome: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub planos_mais_escolhidos: Vec<RankEntry>,
    pub parceiras_mais_escolhidas: Vec<RankEntry>,
    pub marcas_mais_comuns: Vec<RankEntry>,
}

/// Query string of the dashboard endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub plano: Option<String>,
    pub marca: Option<String>,
}

/// One table row of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationRow {
    pub id: Uuid,
    pub data: String,
    pub nome: String,
    pub contato: String,
    pub veiculo: String,
    pub placa: String,
    pub plano: String,
    pub parceiras: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub stats: Stats,
    pub total_resultados: usize,
    pub simulacoes: Vec<SimulationRow>,
}
