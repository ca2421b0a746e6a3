//! Serializable result records.

use ns_eos::{EosTable, EquationOfState};
use ns_sequence::{LocatedStar, MrSequence, RejectedStar};
use ns_sim::NeutronStar;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub eos_name: String,
    pub timestamp: String,
    pub run_type: RunType,
    pub solver_version: String,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time.
    pub fn new(
        run_id: impl Into<RunId>,
        eos_name: impl Into<String>,
        run_type: RunType,
        solver_version: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            eos_name: eos_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_type,
            solver_version: solver_version.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunType {
    Sequence { num_points: usize },
    Profile { p_c: f64 },
}

/// One star of a sequence, in code units plus solar masses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    pub p_c: f64,
    pub eps_c: f64,
    pub radius_km: f64,
    pub mass_code: f64,
    pub mass_solar: f64,
    pub k2: Option<f64>,
    pub lambda: Option<f64>,
    pub converged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    /// Auxiliary EOS columns at p_c, aligned with the owning record's
    /// `column_names`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub central_columns: Vec<f64>,
}

impl StarRecord {
    pub fn from_star(star: &NeutronStar, stable: Option<bool>, table: Option<&EosTable>) -> Self {
        Self {
            p_c: star.p_c,
            eps_c: star.eps_c,
            radius_km: star.radius,
            mass_code: star.mass,
            mass_solar: star.mass_solar(),
            k2: star.k2(),
            lambda: star.lambda(),
            converged: star.converged,
            stable,
            central_columns: table
                .map(|t| t.auxiliary_row(star.p_c).into_iter().map(|(_, v)| v).collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub p_c: f64,
    pub reason: String,
    pub detail: String,
}

impl From<&RejectedStar> for RejectedRecord {
    fn from(r: &RejectedStar) -> Self {
        Self {
            p_c: r.p_c,
            reason: r.reason.to_string(),
            detail: r.detail.clone(),
        }
    }
}

/// A full mass-radius sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub eos_name: String,
    #[serde(default)]
    pub column_names: Vec<String>,
    pub stars: Vec<StarRecord>,
    pub max_mass_index: Option<usize>,
    #[serde(default)]
    pub rejected: Vec<RejectedRecord>,
}

impl SequenceRecord {
    /// Auxiliary columns at the centre are included when `table` is given.
    pub fn from_sequence(sequence: &MrSequence, table: Option<&EosTable>) -> Self {
        Self {
            eos_name: sequence.eos_name().to_string(),
            column_names: table.map(|t| t.aux_names().to_vec()).unwrap_or_default(),
            stars: sequence
                .points()
                .iter()
                .map(|p| StarRecord::from_star(&p.star, Some(p.stable), table))
                .collect(),
            max_mass_index: sequence.max_mass_index(),
            rejected: sequence.rejected().iter().map(RejectedRecord::from).collect(),
        }
    }

    pub fn max_mass_star(&self) -> Option<&StarRecord> {
        self.max_mass_index.and_then(|i| self.stars.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub r: f64,
    pub m: f64,
    pub p: f64,
    pub eps: f64,
    pub nu: f64,
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<f64>,
}

/// A single star with its radial profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarProfileRecord {
    pub eos_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRecord>,
    #[serde(default)]
    pub column_names: Vec<String>,
    pub star: StarRecord,
    pub profile: Vec<ProfilePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetRecord {
    Mass { value_solar: f64, iterations: usize },
    Radius { value_km: f64, iterations: usize },
}

impl StarProfileRecord {
    /// `table` supplies auxiliary columns along the profile; ε always comes
    /// from `eos`.
    pub fn from_star<E: EquationOfState + ?Sized>(
        star: &NeutronStar,
        eos: &E,
        table: Option<&EosTable>,
    ) -> Self {
        let profile = star
            .profile
            .iter()
            .flat_map(|p| p.iter())
            .map(|s| ProfilePoint {
                r: s.r,
                m: s.m,
                p: s.p,
                eps: eos.energy_density(s.p),
                nu: s.nu,
                y: s.y,
                columns: table
                    .map(|t| t.auxiliary_row(s.p).into_iter().map(|(_, v)| v).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            eos_name: eos.name().to_string(),
            target: None,
            column_names: table.map(|t| t.aux_names().to_vec()).unwrap_or_default(),
            star: StarRecord::from_star(star, None, table),
            profile,
        }
    }

    pub fn from_located<E: EquationOfState + ?Sized>(
        located: &LocatedStar,
        eos: &E,
        table: Option<&EosTable>,
    ) -> Self {
        let target = match located.target {
            ns_sequence::Target::Mass(m) => TargetRecord::Mass {
                value_solar: m,
                iterations: located.iterations,
            },
            ns_sequence::Target::Radius(r) => TargetRecord::Radius {
                value_km: r,
                iterations: located.iterations,
            },
        };
        Self {
            target: Some(target),
            ..Self::from_star(&located.star, eos, table)
        }
    }
}
