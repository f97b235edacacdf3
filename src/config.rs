use serde::Deserialize;

use crate::catalog::SelectionMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub plan_selection_mode: SelectionMode,
    pub display_utc_offset_hours: i32,
    pub simulations_table: String,
    pub roles_table: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            supabase_url: var("SUPABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("SUPABASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SUPABASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })?,
            supabase_anon_key: var("SUPABASE_ANON_KEY")
                .or_else(|| var("SUPABASE_PUBLISHABLE_KEY"))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "SUPABASE_ANON_KEY or SUPABASE_PUBLISHABLE_KEY environment variable required"
                    )
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("SUPABASE_ANON_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            plan_selection_mode: match var("PLAN_SELECTION_MODE") {
                None => SelectionMode::Multi,
                Some(raw) => raw.parse::<SelectionMode>().map_err(|_| {
                    anyhow::anyhow!("PLAN_SELECTION_MODE must be 'multi' or 'single'")
                })?,
            },
            display_utc_offset_hours: var("DISPLAY_UTC_OFFSET_HOURS")
                .unwrap_or_else(|| "-3".to_string())
                .parse::<i32>()
                .map_err(|_| anyhow::anyhow!("DISPLAY_UTC_OFFSET_HOURS must be an integer"))
                .and_then(|hours| {
                    if !(-12..=14).contains(&hours) {
                        anyhow::bail!("DISPLAY_UTC_OFFSET_HOURS must be between -12 and 14");
                    }
                    Ok(hours)
                })?,
            simulations_table: var("SIMULATIONS_TABLE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "insurance_simulations".to_string()),
            roles_table: var("ROLES_TABLE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "user_roles".to_string()),
        };

        // Never log the key itself
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Supabase URL: {}", config.supabase_url);
        tracing::debug!("Plan selection mode: {:?}", config.plan_selection_mode);
        tracing::debug!(
            "Tables: simulations={}, roles={}",
            config.simulations_table,
            config.roles_table
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
