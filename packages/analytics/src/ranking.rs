//! Top-N ranking of comparison rows.

use rhna_analytics_models::{ComparisonRow, RankQuery, RankedRow, TiePolicy};

/// Ranks `rows` by `query.metric`, largest first.
///
/// Rows with an undefined value never rank. Equal values keep their input
/// order and share a rank. Under [`TiePolicy::Strict`] exactly `n` rows
/// come back (fewer if fewer qualify); under [`TiePolicy::IncludeTies`]
/// every row tied with the `n`-th is kept as well.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn top_n(rows: &[ComparisonRow], query: &RankQuery) -> Vec<RankedRow> {
    if query.n == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(f64, &ComparisonRow)> = rows
        .iter()
        .filter(|row| query.level.is_none_or(|level| row.income_level == level))
        .filter_map(|row| row.metric(query.metric).value().map(|v| (v, row)))
        .filter(|(value, _)| query.threshold.is_none_or(|min| *value >= min))
        .collect();

    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut len = candidates.len().min(query.n);
    if query.ties == TiePolicy::IncludeTies && len > 0 {
        let cutoff = candidates[len - 1].0;
        while len < candidates.len() && candidates[len].0 == cutoff {
            len += 1;
        }
    }
    candidates.truncate(len);

    let mut ranked: Vec<RankedRow> = Vec::with_capacity(len);
    for (i, (value, row)) in candidates.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(previous) if previous.value == value => previous.rank,
            _ => i + 1,
        };
        ranked.push(RankedRow {
            rank,
            value,
            row: row.clone(),
        });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use rhna_analytics_models::Metric;
    use rhna_housing_models::{County, IncomeLevel, ReportLevel};

    use super::*;
    use crate::metrics::tests::{build, permit, target};

    fn rows() -> Vec<ComparisonRow> {
        let names = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
        let permitted = [60, 30, 30, 30, 0];
        let targets: Vec<_> = names
            .iter()
            .map(|name| target(name, County::Alameda, [80, 0, 0, 0]))
            .collect();
        let permits: Vec<_> = names
            .iter()
            .zip(permitted)
            .map(|(name, units)| permit(name, 2015, IncomeLevel::VeryLow, units))
            .collect();
        build(&targets, &permits, &[]).table.rows
    }

    fn query(n: usize, ties: TiePolicy) -> RankQuery {
        RankQuery {
            metric: Metric::Progress,
            level: Some(ReportLevel::VeryLow),
            n,
            threshold: None,
            ties,
        }
    }

    fn names(ranked: &[RankedRow]) -> Vec<&str> {
        ranked.iter().map(|r| r.row.jurisdiction.as_str()).collect()
    }

    #[test]
    fn strict_truncates_at_n() {
        let ranked = top_n(&rows(), &query(2, TiePolicy::Strict));
        assert_eq!(names(&ranked), vec!["Alpha", "Bravo"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn include_ties_extends_through_cutoff() {
        let ranked = top_n(&rows(), &query(2, TiePolicy::IncludeTies));
        assert_eq!(names(&ranked), vec!["Alpha", "Bravo", "Charlie", "Delta"]);
        assert!(ranked[1..].iter().all(|r| r.rank == 2));
    }

    #[test]
    fn undefined_values_never_rank() {
        let ranked = top_n(
            &rows(),
            &RankQuery {
                level: Some(ReportLevel::Low),
                ..query(10, TiePolicy::Strict)
            },
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn threshold_filters_rows() {
        let ranked = top_n(
            &rows(),
            &RankQuery {
                threshold: Some(1.0),
                ..query(10, TiePolicy::Strict)
            },
        );
        assert_eq!(names(&ranked), vec!["Alpha", "Bravo", "Charlie", "Delta"]);

        let ranked = top_n(
            &rows(),
            &RankQuery {
                threshold: Some(1.5),
                ..query(10, TiePolicy::Strict)
            },
        );
        assert_eq!(names(&ranked), vec!["Alpha"]);
    }

    #[test]
    fn zero_n_is_empty() {
        assert!(top_n(&rows(), &query(0, TiePolicy::IncludeTies)).is_empty());
    }
}
