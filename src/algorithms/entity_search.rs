use crate::id::NodeInfo;
use crate::local_data::DsnHandler;
use crate::messages::entity_search::QueryScope;

/// Whether enough matches have accumulated to answer a `FindQueryRequest`:
/// `All` needs every holder the DSN knows about, `Some` truncates to a fixed
/// count (`kFindQuerySomeScopeThreshold`) rather than a fraction of the
/// total — a query asking for "some" results doesn't get slower just
/// because the DSN's subtree grew.
///
/// Grounded on spec.md §4.7.
pub fn aggregation_satisfied(scope: QueryScope, matches_found: usize, dsn_total: usize, some_scope_threshold: usize) -> bool {
    match scope {
        QueryScope::All => matches_found >= dsn_total,
        // Can't demand more matches than the DSN actually has.
        QueryScope::Some => matches_found >= some_scope_threshold.min(dsn_total),
    }
}

/// Truncates `matches` to the scope's limit — `Some` never returns more
/// than `some_scope_threshold` entries even if more were found.
pub fn truncate_to_scope(mut matches: Vec<NodeInfo>, scope: QueryScope, some_scope_threshold: usize) -> Vec<NodeInfo> {
    if scope == QueryScope::Some && matches.len() > some_scope_threshold {
        matches.truncate(some_scope_threshold);
    }
    matches
}

pub fn matches_for(dsn: &DsnHandler, attribute: &str, staleness_window: std::time::Duration) -> Vec<NodeInfo> {
    dsn.holders_of(attribute, staleness_window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_scope_requires_every_response() {
        assert!(!aggregation_satisfied(QueryScope::All, 2, 3, 5));
        assert!(aggregation_satisfied(QueryScope::All, 3, 3, 5));
    }

    #[test]
    fn some_scope_stops_at_the_fixed_threshold_not_a_fraction() {
        // A huge DSN subtree must not push the bar past the fixed count.
        assert!(!aggregation_satisfied(QueryScope::Some, 4, 1_000, 5));
        assert!(aggregation_satisfied(QueryScope::Some, 5, 1_000, 5));
    }

    #[test]
    fn some_scope_is_satisfiable_even_if_dsn_total_is_smaller_than_threshold() {
        assert!(aggregation_satisfied(QueryScope::Some, 2, 2, 5));
    }

    #[test]
    fn truncation_caps_some_scoped_results() {
        use crate::network_info::NetworkInfo;
        use crate::uuid_gen::Uuid;
        use std::net::Ipv4Addr;

        let matches: Vec<NodeInfo> = (0..10)
            .map(|tag| NodeInfo::new(Uuid::from_bytes([tag; 16]), NetworkInfo::new(Ipv4Addr::LOCALHOST, 2000 + tag as u16)))
            .collect();
        let truncated = truncate_to_scope(matches, QueryScope::Some, 3);
        assert_eq!(truncated.len(), 3);
    }
}
