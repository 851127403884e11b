use super::gateway::CategoryLabels;
use super::reporting::CategoryShare;
use crate::domain::{CategoryAmounts, Cents, percentage_of};

/// Turn per-category expense amounts into shares of `total_expenses`.
///
/// Output keeps the source order. Codes are replaced by their display label
/// when `labels` knows them.
pub fn build_category_breakdown(
    by_category: &CategoryAmounts,
    total_expenses: Cents,
    labels: &CategoryLabels,
) -> Vec<CategoryShare> {
    by_category
        .iter()
        .map(|(code, amount)| CategoryShare {
            category: labels.resolve(code).to_string(),
            amount,
            percentage_of_total_expenses: percentage_of(amount, total_expenses),
        })
        .collect()
}
