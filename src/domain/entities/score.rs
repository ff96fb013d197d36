use rust_decimal::Decimal;

use super::ids::RsxId;
use super::variance::VarianceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreBand {
    Green,
    Amber,
    Orange,
    Red,
}

impl ScoreBand {
    pub fn from_score(score: i64) -> Self {
        if score >= 90 {
            ScoreBand::Green
        } else if score >= 75 {
            ScoreBand::Amber
        } else if score >= 60 {
            ScoreBand::Orange
        } else {
            ScoreBand::Red
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            ScoreBand::Green => "Reconciliation is in strong shape; residual variance is noise.",
            ScoreBand::Amber => "Minor reconciliation gaps; review the top variance accounts.",
            ScoreBand::Orange => "Material reconciliation gaps; prioritize remediation this cycle.",
            ScoreBand::Red => "Structural reconciliation breakdown; escalate before close.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub subscription_pct: f64,
    pub arr_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    pub entity_match_rate: f64,
    pub billing_coverage: f64,
    pub variance_cleanliness: f64,
    pub lineage_completeness: f64,
}

impl ComponentScores {
    pub const WEIGHT_ENTITY_MATCH_RATE: f64 = 0.25;
    pub const WEIGHT_BILLING_COVERAGE: f64 = 0.35;
    pub const WEIGHT_VARIANCE_CLEANLINESS: f64 = 0.25;
    pub const WEIGHT_LINEAGE_COMPLETENESS: f64 = 0.15;

    pub fn weighted_score(&self) -> i64 {
        let weighted = self.entity_match_rate * Self::WEIGHT_ENTITY_MATCH_RATE
            + self.billing_coverage * Self::WEIGHT_BILLING_COVERAGE
            + self.variance_cleanliness * Self::WEIGHT_VARIANCE_CLEANLINESS
            + self.lineage_completeness * Self::WEIGHT_LINEAGE_COMPLETENESS;
        weighted.round() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueAtRiskEntry {
    pub status: VarianceStatus,
    pub total: Decimal,
    pub account_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickFinding {
    pub rsx_id: RsxId,
    pub account_name: String,
    pub total_variance: Decimal,
    pub primary_variance_type: VarianceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub coverage: Coverage,
    pub components: ComponentScores,
    pub score: i64,
    pub band: ScoreBand,
    pub revenue_at_risk: Vec<RevenueAtRiskEntry>,
    pub quick_findings: Vec<QuickFinding>,
}
