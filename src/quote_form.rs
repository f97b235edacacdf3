//! Quote simulation form: local state, validation and submission.

use crate::backend::SharedBackend;
use crate::catalog::{Catalog, SelectionMode, PLAN_SEPARATOR};
use crate::errors::AppError;
use crate::models::{NewSimulation, SimulationRequest, ThankYouSummary};
use crate::obs::fingerprint;

pub const MSG_NO_PLAN: &str = "Por favor, selecione pelo menos um plano";
pub const MSG_MISSING_FIELDS: &str = "Por favor, preencha todos os campos obrigatórios";
pub const MSG_SINGLE_PLAN: &str = "Por favor, selecione apenas um plano";
pub const MSG_PARTNERS_NOT_ALLOWED: &str =
    "As parceiras só podem ser escolhidas nos planos HBS Select e HBS Economic";
pub const MSG_THANK_YOU: &str = "Sua simulação foi enviada com sucesso! Nossa equipe entrará em contato em breve para apresentar as melhores opções para você.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Nome,
    Contato,
    Ano,
    Marca,
    Modelo,
    Placa,
}

/// The six required text inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFields {
    pub nome: String,
    pub contato: String,
    pub ano: String,
    pub marca: String,
    pub modelo: String,
    pub placa: String,
}

impl CustomerFields {
    fn all(&self) -> [&str; 6] {
        [
            &self.nome,
            &self.contato,
            &self.ano,
            &self.marca,
            &self.modelo,
            &self.placa,
        ]
    }
}

/// Editable state of one form instance.
///
/// Partner selection is only non-empty while at least one selected plan
/// allows partners.
#[derive(Debug, Clone)]
pub struct QuoteForm {
    catalog: Catalog,
    fields: CustomerFields,
    selected_plans: Vec<String>,
    selected_partners: Vec<String>,
}

impl QuoteForm {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            fields: CustomerFields::default(),
            selected_plans: Vec::new(),
            selected_partners: Vec::new(),
        }
    }

    /// Rebuilds form state from a submitted body.
    ///
    /// Repeated ids are ignored. Partners sent while no eligible plan is
    /// selected are dropped, the same way switching plans clears them.
    pub fn from_request(catalog: Catalog, request: SimulationRequest) -> Result<Self, AppError> {
        let mut form = Self::new(catalog);
        form.fields = CustomerFields {
            nome: request.nome,
            contato: request.contato,
            ano: request.ano,
            marca: request.marca,
            modelo: request.modelo,
            placa: request.placa,
        };

        for plan_id in &request.planos {
            if form.selected_plans.contains(plan_id) {
                continue;
            }
            if catalog.selection_mode == SelectionMode::Single && !form.selected_plans.is_empty() {
                return Err(AppError::Validation(MSG_SINGLE_PLAN.to_string()));
            }
            form.toggle_plan(plan_id)?;
        }

        for partner in &request.parceiras {
            if !catalog.is_partner(partner) {
                return Err(AppError::Validation(format!(
                    "Parceira desconhecida: {}",
                    partner
                )));
            }
            if !form.shows_partners() {
                tracing::debug!("Dropping partner '{}' without eligible plan", partner);
                continue;
            }
            if !form.selected_partners.contains(partner) {
                form.toggle_partner(partner)?;
            }
        }

        Ok(form)
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Nome => self.fields.nome = value,
            Field::Contato => self.fields.contato = value,
            Field::Ano => self.fields.ano = value,
            Field::Marca => self.fields.marca = value,
            Field::Modelo => self.fields.modelo = value,
            Field::Placa => self.fields.placa = value,
        }
    }

    pub fn fields(&self) -> &CustomerFields {
        &self.fields
    }

    pub fn selected_plans(&self) -> &[String] {
        &self.selected_plans
    }

    pub fn selected_partners(&self) -> &[String] {
        &self.selected_partners
    }

    /// Whether the partner picker is enabled.
    pub fn shows_partners(&self) -> bool {
        self.selected_plans
            .iter()
            .any(|id| self.catalog.allows_partners(id))
    }

    /// Selects or deselects a plan.
    ///
    /// In single mode picking a plan replaces the current one.
    pub fn toggle_plan(&mut self, plan_id: &str) -> Result<(), AppError> {
        if self.catalog.plan(plan_id).is_none() {
            return Err(AppError::Validation(format!("Plano desconhecido: {}", plan_id)));
        }

        if let Some(pos) = self.selected_plans.iter().position(|p| p == plan_id) {
            self.selected_plans.remove(pos);
        } else {
            if self.catalog.selection_mode == SelectionMode::Single {
                self.selected_plans.clear();
            }
            self.selected_plans.push(plan_id.to_string());
        }

        if !self.shows_partners() && !self.selected_partners.is_empty() {
            tracing::debug!("No partner-eligible plan selected, clearing partners");
            self.selected_partners.clear();
        }
        Ok(())
    }

    pub fn toggle_partner(&mut self, partner: &str) -> Result<(), AppError> {
        if !self.catalog.is_partner(partner) {
            return Err(AppError::Validation(format!(
                "Parceira desconhecida: {}",
                partner
            )));
        }
        if !self.shows_partners() {
            return Err(AppError::Validation(MSG_PARTNERS_NOT_ALLOWED.to_string()));
        }

        if let Some(pos) = self.selected_partners.iter().position(|p| p == partner) {
            self.selected_partners.remove(pos);
        } else {
            self.selected_partners.push(partner.to_string());
        }
        Ok(())
    }

    /// Checks the form and produces the normalized row to insert.
    pub fn validate(&self) -> Result<NewSimulation, AppError> {
        if self.selected_plans.is_empty() {
            return Err(AppError::Validation(MSG_NO_PLAN.to_string()));
        }
        if self.fields.all().iter().any(|v| v.trim().is_empty()) {
            return Err(AppError::Validation(MSG_MISSING_FIELDS.to_string()));
        }

        Ok(NewSimulation {
            nome: self.fields.nome.trim().to_string(),
            contato: self.fields.contato.trim().to_string(),
            ano: self.fields.ano.trim().to_string(),
            marca: self.fields.marca.trim().to_string(),
            modelo: self.fields.modelo.trim().to_string(),
            placa: self.fields.placa.trim().to_uppercase(),
            plano_selecionado: self.selected_plans.join(PLAN_SEPARATOR),
            parceiras_selecionadas: self.selected_partners.clone(),
        })
    }

    /// Confirmation view payload for a stored row.
    pub fn summary(&self, stored: &NewSimulation) -> ThankYouSummary {
        ThankYouSummary {
            nome: stored.nome.clone(),
            contato: stored.contato.clone(),
            veiculo: format!("{} {} ({})", stored.marca, stored.modelo, stored.ano),
            placa: stored.placa.clone(),
            planos: self
                .selected_plans
                .iter()
                .map(|id| self.catalog.plan_label(id).to_string())
                .collect(),
            parceiras: stored.parceiras_selecionadas.clone(),
            mensagem: MSG_THANK_YOU.to_string(),
        }
    }
}

/// Submits quote forms to the backend it was built with.
#[derive(Clone)]
pub struct QuoteService {
    backend: SharedBackend,
    catalog: Catalog,
}

impl QuoteService {
    pub fn new(backend: SharedBackend, catalog: Catalog) -> Self {
        Self { backend, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Validates, normalizes and inserts one simulation.
    ///
    /// Nothing is written when validation fails.
    pub async fn submit(&self, request: SimulationRequest) -> Result<ThankYouSummary, AppError> {
        let form = QuoteForm::from_request(self.catalog, request)?;
        self.submit_form(&form).await
    }

    pub async fn submit_form(&self, form: &QuoteForm) -> Result<ThankYouSummary, AppError> {
        let record = form.validate()?;

        tracing::info!(
            "📨 Submitting simulation: contact={}, plans={}, partners={}",
            fingerprint(&record.contato),
            record.plano_selecionado,
            record.parceiras_selecionadas.len()
        );

        self.backend.insert_simulation(&record).await.map_err(|e| {
            if matches!(e.root(), AppError::RemoteWrite(_)) {
                e
            } else {
                AppError::RemoteWrite(e.to_string())
            }
        })?;

        Ok(form.summary(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi() -> QuoteForm {
        QuoteForm::new(Catalog::standard(SelectionMode::Multi))
    }

    fn filled(form: &mut QuoteForm) {
        form.set_field(Field::Nome, "  Maria Souza ");
        form.set_field(Field::Contato, "(11) 98888-7777");
        form.set_field(Field::Ano, "2019");
        form.set_field(Field::Marca, "Volkswagen");
        form.set_field(Field::Modelo, "Gol");
        form.set_field(Field::Placa, " abc-1234 ");
    }

    #[test]
    fn test_no_plan_rejected_first() {
        let form = multi();
        let err = form.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_NO_PLAN));
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut form = multi();
        filled(&mut form);
        form.set_field(Field::Modelo, "   ");
        form.toggle_plan("hbs_majorado").unwrap();

        let err = form.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_MISSING_FIELDS));
    }

    #[test]
    fn test_normalization() {
        let mut form = multi();
        filled(&mut form);
        form.toggle_plan("hbs_select").unwrap();
        form.toggle_plan("hbs_com_seguro").unwrap();
        form.toggle_partner("Baypro").unwrap();

        let record = form.validate().unwrap();
        assert_eq!(record.nome, "Maria Souza");
        assert_eq!(record.placa, "ABC-1234");
        assert_eq!(record.plano_selecionado, "hbs_select, hbs_com_seguro");
        assert_eq!(record.parceiras_selecionadas, vec!["Baypro".to_string()]);
    }

    #[test]
    fn test_switching_away_clears_partners() {
        let mut form = multi();
        form.toggle_plan("hbs_economic").unwrap();
        form.toggle_partner("Moove").unwrap();
        form.toggle_plan("hbs_majorado").unwrap();
        assert_eq!(form.selected_partners().len(), 1);

        form.toggle_plan("hbs_economic").unwrap();
        assert!(!form.shows_partners());
        assert!(form.selected_partners().is_empty());
    }

    #[test]
    fn test_single_mode_replaces_and_clears() {
        let mut form = QuoteForm::new(Catalog::standard(SelectionMode::Single));
        form.toggle_plan("hbs_select").unwrap();
        form.toggle_partner("FCK").unwrap();
        form.toggle_plan("safeclub_bradesco").unwrap();

        assert_eq!(form.selected_plans(), ["safeclub_bradesco".to_string()]);
        assert!(form.selected_partners().is_empty());
    }

    #[test]
    fn test_partner_requires_eligible_plan() {
        let mut form = multi();
        form.toggle_plan("hbs_majorado").unwrap();
        assert!(form.toggle_partner("FCK").is_err());
        assert!(form.toggle_plan("nope").is_err());
    }

    #[test]
    fn test_from_request_drops_ineligible_partners() {
        let request = SimulationRequest {
            planos: vec!["hbs_majorado".into(), "hbs_majorado".into()],
            parceiras: vec!["AGV".into()],
            ..Default::default()
        };
        let form = QuoteForm::from_request(Catalog::standard(SelectionMode::Multi), request).unwrap();
        assert_eq!(form.selected_plans().len(), 1);
        assert!(form.selected_partners().is_empty());
    }

    #[test]
    fn test_from_request_single_mode_rejects_two_plans() {
        let request = SimulationRequest {
            planos: vec!["hbs_select".into(), "hbs_majorado".into()],
            ..Default::default()
        };
        let result = QuoteForm::from_request(Catalog::standard(SelectionMode::Single), request);
        assert!(matches!(result, Err(AppError::Validation(ref m)) if m == MSG_SINGLE_PLAN));
    }

    #[test]
    fn test_summary() {
        let mut form = multi();
        filled(&mut form);
        form.toggle_plan("safeclub_bradesco").unwrap();
        let record = form.validate().unwrap();
        let summary = form.summary(&record);

        assert_eq!(summary.veiculo, "Volkswagen Gol (2019)");
        assert_eq!(summary.planos, vec!["SAFECLUB [Bradesco]".to_string()]);
    }
}
