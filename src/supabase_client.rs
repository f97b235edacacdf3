use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::backend::SimulationBackend;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AuthUser, NewSimulation, RoleRow, Session, SimulationRecord};

/// Client for the hosted backend's REST surface.
///
/// Tables are reached through `/rest/v1/{table}` and authentication through
/// `/auth/v1/*`. Every request carries the project's anon key in the
/// `apikey` header; user-scoped requests add the session's bearer token so
/// row-level policies apply.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    simulations_table: String,
    roles_table: String,
}

impl SupabaseClient {
    /// Creates a new `SupabaseClient` with the default table names.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`.
    /// * `anon_key` - Public anon key of the project.
    pub fn new(base_url: String, anon_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create Supabase client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            simulations_table: "insurance_simulations".to_string(),
            roles_table: "user_roles".to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(config.supabase_url.clone(), config.supabase_anon_key.clone())?
            .with_tables(&config.simulations_table, &config.roles_table))
    }

    pub fn with_tables(mut self, simulations_table: &str, roles_table: &str) -> Self {
        self.simulations_table = simulations_table.to_string();
        self.roles_table = roles_table.to_string();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| AppError::Internal(format!("Invalid backend URL for {}: {}", path, e)))
    }

    fn table_endpoint(&self, table: &str) -> Result<Url, AppError> {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }
}

async fn error_text(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[async_trait]
impl SimulationBackend for SupabaseClient {
    async fn insert_simulation(&self, record: &NewSimulation) -> Result<(), AppError> {
        let url = self.table_endpoint(&self.simulations_table)?;
        tracing::debug!("Inserting simulation into {}", self.simulations_table);

        let response = self
            .authorized(self.client.post(url), &self.anon_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| AppError::RemoteWrite(format!("Insert request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_text(response).await;
            return Err(AppError::RemoteWrite(format!(
                "Insert into {} returned {}: {}",
                self.simulations_table, status, error_text
            )));
        }

        tracing::info!("✓ Simulation stored");
        Ok(())
    }

    async fn list_simulations(
        &self,
        access_token: &str,
    ) -> Result<Vec<SimulationRecord>, AppError> {
        let mut url = self.table_endpoint(&self.simulations_table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self
            .authorized(self.client.get(url), access_token)
            .send()
            .await
            .map_err(|e| AppError::RemoteRead(format!("Select request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_text(response).await;
            return Err(AppError::RemoteRead(format!(
                "Select from {} returned {}: {}",
                self.simulations_table, status, error_text
            )));
        }

        let records: Vec<SimulationRecord> = response.json().await.map_err(|e| {
            AppError::RemoteRead(format!("Failed to parse simulations: {}", e))
        })?;

        tracing::info!("Fetched {} simulations", records.len());
        Ok(records)
    }

    async fn fetch_roles(&self, user_id: &str, access_token: &str) -> Result<Vec<String>, AppError> {
        let mut url = self.table_endpoint(&self.roles_table)?;
        url.query_pairs_mut()
            .append_pair("select", "role")
            .append_pair("user_id", &format!("eq.{}", user_id));

        let response = self
            .authorized(self.client.get(url), access_token)
            .send()
            .await
            .map_err(|e| AppError::RemoteRead(format!("Role lookup failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_text(response).await;
            return Err(AppError::RemoteRead(format!(
                "Role lookup returned {}: {}",
                status, error_text
            )));
        }

        let rows: Vec<RoleRow> = response
            .json()
            .await
            .map_err(|e| AppError::RemoteRead(format!("Failed to parse roles: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.role).collect())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Sign-in request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_text(response).await;
            return Err(AppError::Auth(format!(
                "Sign-in returned {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse session: {}", e)))
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        let url = self.endpoint("auth/v1/user")?;

        let response = self
            .authorized(self.client.get(url), access_token)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Session lookup failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let user = response
                    .json()
                    .await
                    .map_err(|e| AppError::Auth(format!("Failed to parse user: {}", e)))?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let error_text = error_text(response).await;
                Err(AppError::Auth(format!(
                    "Session lookup returned {}: {}",
                    status, error_text
                )))
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = self.endpoint("auth/v1/logout")?;

        let response = self
            .authorized(self.client.post(url), access_token)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Sign-out request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Token already gone; nothing left to revoke
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(()),
            status => {
                let error_text = error_text(response).await;
                Err(AppError::Auth(format!(
                    "Sign-out returned {}: {}",
                    status, error_text
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SupabaseClient::new("https://example.com/".to_string(), "anon".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_table_endpoint() {
        let client = SupabaseClient::new("https://example.com/".to_string(), "anon".to_string())
            .unwrap()
            .with_tables("sims", "roles");
        let url = client.table_endpoint("sims").unwrap();
        assert_eq!(url.as_str(), "https://example.com/rest/v1/sims");
    }
}
