use crate::geometry::BubbleCandidate;

/// Collapse overlapping circle detections to one representative each.
///
/// Greedy single pass in input order: a candidate is dropped when its
/// center lies closer than `(r_a + r_b) * overlap_factor` to an already
/// kept candidate, so earlier candidates win. The result depends on input
/// order; callers pass detector output unchanged.
pub fn dedup_bubbles(candidates: &[BubbleCandidate], overlap_factor: f64) -> Vec<BubbleCandidate> {
    let mut kept: Vec<BubbleCandidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let overlaps = kept.iter().any(|other| {
            let limit = (candidate.radius + other.radius) as f64 * overlap_factor;
            candidate.distance_to(other) < limit
        });
        if !overlaps {
            kept.push(*candidate);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_inner_and_outer_contours_collapse() {
        let raw = [
            BubbleCandidate::new(100, 100, 34),
            BubbleCandidate::new(101, 100, 31),
            BubbleCandidate::new(180, 100, 34),
        ];
        let kept = dedup_bubbles(&raw, 0.5);
        assert_eq!(
            kept,
            vec![
                BubbleCandidate::new(100, 100, 34),
                BubbleCandidate::new(180, 100, 34)
            ]
        );
    }

    #[test]
    fn first_seen_candidate_wins() {
        let raw = [BubbleCandidate::new(10, 10, 8), BubbleCandidate::new(12, 10, 12)];
        assert_eq!(dedup_bubbles(&raw, 0.5), vec![BubbleCandidate::new(10, 10, 8)]);
        let reversed = [raw[1], raw[0]];
        assert_eq!(dedup_bubbles(&reversed, 0.5), vec![BubbleCandidate::new(12, 10, 12)]);
    }

    #[test]
    fn distance_at_the_limit_is_not_an_overlap() {
        // (10 + 10) * 0.5 = 10, distance exactly 10
        let raw = [BubbleCandidate::new(0, 0, 10), BubbleCandidate::new(10, 0, 10)];
        assert_eq!(dedup_bubbles(&raw, 0.5).len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(dedup_bubbles(&[], 0.5).is_empty());
    }
}
