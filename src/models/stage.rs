// src/models/stage.rs

//! Deal funnel stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tracked stage of the deal funnel.
///
/// Each stage maps to a fixed Imoview phase code on the source side and a
/// conversion identifier on the RD Station side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Visit,
    Proposal,
    Sale,
}

impl Stage {
    /// All stages in processing order.
    pub const ALL: [Stage; 3] = [Stage::Visit, Stage::Proposal, Stage::Sale];

    /// Imoview phase code for deal queries.
    pub fn phase_code(&self) -> u32 {
        match self {
            Stage::Visit => 4,
            Stage::Proposal => 5,
            Stage::Sale => 6,
        }
    }

    /// Conversion identifier reported to RD Station.
    pub fn conversion_identifier(&self) -> &'static str {
        match self {
            Stage::Visit => "imoview-update_Visita",
            Stage::Proposal => "imoview-update_Proposta",
            Stage::Sale => "imoview-update_Venda",
        }
    }

    /// Stage label as the CRM names it.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Visit => "Visita",
            Stage::Proposal => "Proposta",
            Stage::Sale => "Venda",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
