//! Admin dashboard: aggregation, filtering and row presentation.
//!
//! Everything here except [`DashboardService::load`] is a pure function over
//! the fetched list. Filters run in memory against the full set; the backend
//! is queried once per load.

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;

use crate::auth_guard::AdminSession;
use crate::backend::SharedBackend;
use crate::catalog::{split_plan_ids, Catalog};
use crate::errors::{AppError, ResultExt};
use crate::models::{
    DashboardQuery, DashboardResponse, RankEntry, SimulationRecord, SimulationRow, Stats,
};

/// How many entries each ranking keeps.
pub const TOP_N: usize = 5;

/// Placeholder shown when a record has no partners.
pub const NO_PARTNERS: &str = "—";

/// Counts occurrences and keeps the `TOP_N` most frequent.
///
/// Ties keep the order in which values were first seen.
pub fn rank<I>(values: I) -> Vec<RankEntry>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (seen, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, seen)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(nome, (count, first))| (nome, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(TOP_N);

    ranked
        .into_iter()
        .map(|(nome, count, _)| RankEntry { nome, count })
        .collect()
}

/// Ranks plan ids. A row that stores several plans counts once for each
/// of them rather than once for the joined string.
pub fn top_plans(records: &[SimulationRecord]) -> Vec<RankEntry> {
    rank(
        records
            .iter()
            .flat_map(|r| split_plan_ids(&r.plano_selecionado).map(str::to_string)),
    )
}

pub fn top_partners(records: &[SimulationRecord]) -> Vec<RankEntry> {
    rank(records.iter().flat_map(|r| r.partners().iter().cloned()))
}

/// Brands are case-folded before counting.
pub fn top_brands(records: &[SimulationRecord]) -> Vec<RankEntry> {
    rank(
        records
            .iter()
            .map(|r| r.marca.trim().to_lowercase())
            .filter(|m| !m.is_empty()),
    )
}

pub fn compute_stats(records: &[SimulationRecord]) -> Stats {
    Stats {
        total: records.len(),
        planos_mais_escolhidos: top_plans(records),
        parceiras_mais_escolhidas: top_partners(records),
        marcas_mais_comuns: top_brands(records),
    }
}

/// Conjunctive, case-insensitive substring filters. Absent terms match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationFilter {
    search: Option<String>,
    plano: Option<String>,
    marca: Option<String>,
}

fn normalize_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl SimulationFilter {
    pub fn new(search: Option<&str>, plano: Option<&str>, marca: Option<&str>) -> Self {
        Self {
            search: normalize_term(search),
            plano: normalize_term(plano),
            marca: normalize_term(marca),
        }
    }

    pub fn from_query(query: &DashboardQuery) -> Self {
        Self::new(
            query.search.as_deref(),
            query.plano.as_deref(),
            query.marca.as_deref(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.plano.is_none() && self.marca.is_none()
    }

    pub fn matches(&self, record: &SimulationRecord, catalog: &Catalog) -> bool {
        if let Some(term) = &self.search {
            let hit = record.nome.to_lowercase().contains(term)
                || record.contato.to_lowercase().contains(term)
                || record.placa.to_lowercase().contains(term);
            if !hit {
                return false;
            }
        }

        if let Some(term) = &self.plano {
            // Match the display label as well as the stored ids
            let label = catalog.stored_plan_label(&record.plano_selecionado);
            let hit = label.to_lowercase().contains(term)
                || record.plano_selecionado.to_lowercase().contains(term);
            if !hit {
                return false;
            }
        }

        if let Some(term) = &self.marca {
            if !record.marca.to_lowercase().contains(term) {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(
        &self,
        records: &'a [SimulationRecord],
        catalog: &Catalog,
    ) -> Vec<&'a SimulationRecord> {
        records.iter().filter(|r| self.matches(r, catalog)).collect()
    }
}

/// Formats a timestamp the way pt-BR locales show date and time:
/// `dd/mm/yyyy, HH:MM`.
pub fn format_date(at: &DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%d/%m/%Y, %H:%M").to_string()
}

pub fn to_row(record: &SimulationRecord, catalog: &Catalog, offset: &FixedOffset) -> SimulationRow {
    let parceiras = if record.partners().is_empty() {
        NO_PARTNERS.to_string()
    } else {
        record.partners().join(", ")
    };

    SimulationRow {
        id: record.id,
        data: format_date(&record.created_at, offset),
        nome: record.nome.clone(),
        contato: record.contato.clone(),
        veiculo: format!("{} {} ({})", record.marca, record.modelo, record.ano),
        placa: record.placa.to_uppercase(),
        plano: catalog.stored_plan_label(&record.plano_selecionado),
        parceiras,
    }
}

/// Stats over the full set plus the filtered table.
pub fn build_view(
    records: &[SimulationRecord],
    filter: &SimulationFilter,
    catalog: &Catalog,
    offset: &FixedOffset,
) -> DashboardResponse {
    let stats = compute_stats(records);
    let simulacoes: Vec<SimulationRow> = filter
        .apply(records, catalog)
        .into_iter()
        .map(|r| to_row(r, catalog, offset))
        .collect();

    DashboardResponse {
        stats,
        total_resultados: simulacoes.len(),
        simulacoes,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    backend: SharedBackend,
    catalog: Catalog,
    offset: FixedOffset,
}

impl DashboardService {
    pub fn new(
        backend: SharedBackend,
        catalog: Catalog,
        utc_offset_hours: i32,
    ) -> Result<Self, AppError> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            AppError::Internal(format!("Invalid display offset: {}h", utc_offset_hours))
        })?;

        Ok(Self {
            backend,
            catalog,
            offset,
        })
    }

    /// Fetches every simulation and builds the dashboard view.
    ///
    /// Requires an [`AdminSession`], which only the admin guard hands out.
    pub async fn load(
        &self,
        admin: &AdminSession,
        query: &DashboardQuery,
    ) -> Result<DashboardResponse, AppError> {
        let records = self
            .backend
            .list_simulations(admin.access_token())
            .await
            .map_err(|e| match e {
                AppError::RemoteRead(_) => e,
                other => AppError::RemoteRead(other.to_string()),
            })
            .context("loading dashboard")?;

        let filter = SimulationFilter::from_query(query);
        let view = build_view(&records, &filter, &self.catalog, &self.offset);

        tracing::info!(
            "Dashboard loaded: total={}, shown={}, filtered={}",
            view.stats.total,
            view.total_resultados,
            !filter.is_empty()
        );

        Ok(view)
    }
}
