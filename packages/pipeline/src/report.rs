//! Data-quality findings collected over one pipeline run.

use rhna_geography_models::{DemographicGap, MatchReport, ResolutionGap};
use rhna_housing_models::IntegrityViolation;
use serde::{Deserialize, Serialize};

/// Every gap and violation found while building the comparison table.
///
/// None of these abort a run; they are surfaced next to the output so a
/// reader can tell which rows rest on incomplete inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Target jurisdictions without a usable boundary.
    pub resolution_gaps: Vec<ResolutionGap>,
    /// Jurisdictions without population or housing counts.
    pub demographic_gaps: Vec<DemographicGap>,
    /// Inputs that contradict each other.
    pub integrity_violations: Vec<IntegrityViolation>,
    /// Target names against resolved boundary names.
    pub match_report: MatchReport,
    /// Permit jurisdictions that match no target or boundary.
    pub unmatched_permit_jurisdictions: Vec<String>,
}

impl RunReport {
    /// Whether the run found nothing to report.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.finding_count() == 0
    }

    /// Total number of findings.
    #[must_use]
    pub fn finding_count(&self) -> usize {
        self.resolution_gaps.len()
            + self.demographic_gaps.len()
            + self.integrity_violations.len()
            + self.match_report.missing.len()
            + self.match_report.extra.len()
            + self.unmatched_permit_jurisdictions.len()
    }
}
