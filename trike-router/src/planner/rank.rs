//! Suggestion scoring and ranking.

use super::config::ScoreWeights;
use super::suggestion::RouteSuggestion;

/// Score a suggestion. Cheaper, fewer transfers and less walking all score
/// higher, and transfer-free trips get a flat bonus.
pub fn score_suggestion(suggestion: &RouteSuggestion, weights: &ScoreWeights, discounted: bool) -> f64 {
    let transfers = suggestion.transfer_count();
    let mut score = weights.base
        - weights.per_fare * suggestion.applicable_fare(discounted)
        - weights.per_transfer * transfers as f64
        - weights.per_walk_km * suggestion.total_walk_km();
    if transfers == 0 {
        score += weights.direct_bonus;
    }
    score
}

/// Rank suggestions best-first and keep at most `limit`.
///
/// Ordered by:
/// 1. Score (higher is better)
/// 2. Number of transfers (fewer is better)
/// 3. Fare (cheaper is better)
/// 4. Zones ridden, for a stable order between equal candidates
pub fn rank_suggestions(
    mut suggestions: Vec<RouteSuggestion>,
    discounted: bool,
    limit: usize,
) -> Vec<RouteSuggestion> {
    suggestions.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.transfer_count().cmp(&b.transfer_count()))
            .then_with(|| {
                a.applicable_fare(discounted)
                    .total_cmp(&b.applicable_fare(discounted))
            })
            .then_with(|| a.zone_ids().cmp(&b.zone_ids()))
    });
    suggestions.truncate(limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use crate::planner::suggestion::{DirectRoute, Leg, TransferRoute};
    use crate::zones::ZoneId;

    fn direct(zone: &str, fare: f64, walk: f64) -> RouteSuggestion {
        RouteSuggestion::Direct(DirectRoute {
            zone_id: ZoneId::for_type(zone),
            zone: zone.to_string(),
            route_name: String::new(),
            color: String::new(),
            description: String::new(),
            start_walk_km: walk,
            end_walk_km: 0.0,
            distance_km: 1.0,
            fare,
            discounted_fare: fare - 2.0,
            score: 0.0,
        })
    }

    fn transfer(fares: &[f64]) -> RouteSuggestion {
        let legs = fares
            .iter()
            .map(|f| Leg {
                zone_id: ZoneId::for_type("orange"),
                zone: String::new(),
                color: String::new(),
                board: Point::new(0.0, 0.0),
                alight: Point::new(0.0, 0.0),
                distance_km: 1.0,
                fare: *f,
                discounted_fare: *f,
                description: String::new(),
            })
            .collect();
        RouteSuggestion::Transfer(TransferRoute::new(legs, Vec::new(), 0.2))
    }

    fn scored(mut s: RouteSuggestion) -> RouteSuggestion {
        let score = score_suggestion(&s, &ScoreWeights::default(), false);
        s.set_score(score);
        s
    }

    #[test]
    fn direct_beats_transfer_at_equal_fare() {
        let d = scored(direct("orange", 18.0, 0.2));
        let t = scored(transfer(&[9.0, 9.0]));
        assert!(d.score() > t.score());
    }

    #[test]
    fn cheaper_scores_higher() {
        let cheap = scored(direct("orange", 9.0, 0.1));
        let dear = scored(direct("red", 11.0, 0.1));
        let ranked = rank_suggestions(vec![dear, cheap.clone()], false, 5);
        assert_eq!(ranked[0], cheap);
    }

    #[test]
    fn discount_changes_fare_used() {
        let s = direct("orange", 9.0, 0.0);
        let w = ScoreWeights::default();
        let diff = score_suggestion(&s, &w, true) - score_suggestion(&s, &w, false);
        assert!((diff - 2.0 * w.per_fare).abs() < 1e-9);
    }

    #[test]
    fn ties_break_by_zone() {
        let a = scored(direct("green", 9.0, 0.1));
        let b = scored(direct("red", 9.0, 0.1));
        let ranked = rank_suggestions(vec![b.clone(), a.clone()], false, 5);
        assert_eq!(ranked, vec![a, b]);
    }

    #[test]
    fn truncates_to_limit() {
        let items = (0..8).map(|i| scored(direct("orange", 9.0 + i as f64, 0.0))).collect();
        let ranked = rank_suggestions(items, false, 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].total_fare(), 9.0);
    }
}
