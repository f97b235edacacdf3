//! Fixed plan and partner catalogs offered by the quote form.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An insurance product the customer can pick.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub nome: &'static str,
    /// Activation fee, empty when not applicable.
    pub taxa: &'static str,
    /// Monthly price, empty when not applicable.
    pub mensalidade: &'static str,
    pub descricao: &'static str,
    pub obs: Option<&'static str>,
    /// Whether partners can be chosen under this plan.
    pub show_parceiras: bool,
}

pub const PLANS: &[Plan] = &[
    Plan {
        id: "hbs_select",
        nome: "HBS Select",
        taxa: "R$ 650,00",
        mensalidade: "R$ 236,00",
        descricao: "Peças novas, indenização com 30 dias",
        obs: None,
        show_parceiras: true,
    },
    Plan {
        id: "hbs_economic",
        nome: "HBS Economic",
        taxa: "R$ 250,00",
        mensalidade: "R$ 165,20",
        descricao: "Peças usadas e paralelas, indenização conforme contrato escolhido (varia de 3 a 10 meses)",
        obs: None,
        show_parceiras: true,
    },
    Plan {
        id: "hbs_majorado",
        nome: "HBS Majorado",
        taxa: "R$ 650,00",
        mensalidade: "R$ 212,40",
        descricao: "Peças novas, indenização em 30 dias",
        obs: Some("Este produto para pessoas que tem seu carro de garagem"),
        show_parceiras: false,
    },
    Plan {
        id: "safeclub_bradesco",
        nome: "SAFECLUB [Bradesco]",
        taxa: "Valor total: R$ 3.654,76",
        mensalidade: "",
        descricao: "Peças novas indenização de 7 a 30 dias",
        obs: None,
        show_parceiras: false,
    },
    Plan {
        id: "hbs_com_seguro",
        nome: "HBS com Seguro",
        taxa: "",
        mensalidade: "",
        descricao: "Apólice de seguro para cobertura de roubo e furto com cortesia de 50% de guincho, vidros, terceiro e colisão",
        obs: None,
        show_parceiras: false,
    },
];

pub const PARTNERS: &[&str] = &[
    "Abrantes",
    "Baypro",
    "Protecar",
    "Fipe Brasil",
    "FCK",
    "Apvs",
    "Protege",
    "Gol plus",
    "Cooperfacil",
    "Lifekar",
    "Progresso",
    "Martolli",
    "Cooperbras",
    "Apotericorn",
    "AGV",
    "Federal car",
    "Aprovat",
    "Qualyclub",
    "Marcla",
    "Defender",
    "Antena",
    "Moove",
    "Proter bem",
];

/// Separator used when several plan ids are stored in one column.
pub const PLAN_SEPARATOR: &str = ", ";

/// Whether the form accepts one plan or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Single,
    Multi,
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(SelectionMode::Single),
            "multi" => Ok(SelectionMode::Multi),
            other => Err(format!("unknown selection mode '{}'", other)),
        }
    }
}

/// The catalog a quote form is driven by.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Catalog {
    pub plans: &'static [Plan],
    pub partners: &'static [&'static str],
    pub selection_mode: SelectionMode,
}

impl Catalog {
    pub fn new(
        plans: &'static [Plan],
        partners: &'static [&'static str],
        selection_mode: SelectionMode,
    ) -> Self {
        Self {
            plans,
            partners,
            selection_mode,
        }
    }

    /// The five-plan catalog with the standard partner list.
    pub fn standard(selection_mode: SelectionMode) -> Self {
        Self::new(PLANS, PARTNERS, selection_mode)
    }

    pub fn plan(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn is_partner(&self, name: &str) -> bool {
        self.partners.contains(&name)
    }

    pub fn allows_partners(&self, plan_id: &str) -> bool {
        self.plan(plan_id).is_some_and(|p| p.show_parceiras)
    }

    /// Display name for a plan id; unknown ids are returned as is.
    pub fn plan_label<'a>(&self, id: &'a str) -> &'a str {
        self.plan(id).map(|p| p.nome).unwrap_or(id)
    }

    /// Display label for a stored plan column, which may hold several ids.
    pub fn stored_plan_label(&self, stored: &str) -> String {
        split_plan_ids(stored)
            .map(|id| self.plan_label(id))
            .collect::<Vec<_>>()
            .join(PLAN_SEPARATOR)
    }
}

/// Splits a stored plan column into its individual ids.
pub fn split_plan_ids(stored: &str) -> impl Iterator<Item = &str> {
    stored.split(',').map(str::trim).filter(|s| !s.is_empty())
}
