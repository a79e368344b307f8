// Incremental repair of a bush's topological order after some of its arcs were reversed.
use std::cmp::Ordering;

use super::NodeId;


/// Restores a topological order after arc reversals.
///
/// `ranges` holds, for each reversed arc, the order positions of its two endpoints.  Ranges
/// that overlap are merged, and each merged range of `order` is stably sorted by `key`, so
/// nodes with equal keys keep their previous relative order.  `positions` is kept the
/// inverse of `order`.  `ranges` is left empty.
///
/// The result is a valid order provided every arc (u, v) of the bush has
/// `key(u) <= key(v)`, with strict inequality for the reversed ones.
pub fn repair_order<F>(order: &mut [NodeId], positions: &mut [usize],
                       ranges: &mut Vec<(usize, usize)>, key: F)
    where F: Fn(NodeId) -> f64
{
    if ranges.is_empty() {
        return;
    }
    for range in ranges.iter_mut() {
        if range.0 > range.1 {
            *range = (range.1, range.0);
        }
    }
    ranges.sort_unstable();

    let mut merged_start = ranges[0].0;
    let mut merged_end = ranges[0].1;
    let mut num_sorted = 0;
    for &(start, end) in ranges.iter().skip(1) {
        if start <= merged_end {
            merged_end = merged_end.max(end);
        } else {
            sort_range(order, positions, merged_start, merged_end, &key);
            num_sorted += 1;
            merged_start = start;
            merged_end = end;
        }
    }
    sort_range(order, positions, merged_start, merged_end, &key);
    log::trace!("Repaired {} reversals in {} ranges", ranges.len(), num_sorted + 1);
    ranges.clear();
}

fn sort_range<F>(order: &mut [NodeId], positions: &mut [usize], start: usize, end: usize,
                 key: &F)
    where F: Fn(NodeId) -> f64
{
    let range = &mut order[start..=end];
    range.sort_by(|&aa, &bb| key(aa).partial_cmp(&key(bb)).unwrap_or(Ordering::Equal));
    for (offset, &node) in range.iter().enumerate() {
        positions[node] = start + offset;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_isaac::Isaac64Rng;

    fn is_valid(order: &[NodeId], positions: &[usize], arcs: &[(NodeId, NodeId)]) -> bool {
        let inverse_ok = order.iter().enumerate().all(|(pos, &node)| positions[node] == pos);
        inverse_ok && arcs.iter().all(|&(uu, vv)| positions[uu] < positions[vv])
    }

    #[test]
    fn test_single_reversal() {
        // arcs 0->1, 0->2, 1->3 and the reversed 3->2 that used to be 2->3
        let mut order = vec![0, 2, 1, 3];
        let mut positions = vec![0, 2, 1, 3];
        let keys = vec![0., 1., 5., 2.];
        let arcs = vec![(0, 1), (0, 2), (1, 3), (3, 2)];
        let mut ranges = vec![(3, 1)];
        repair_order(&mut order, &mut positions, &mut ranges, |node| keys[node]);
        assert!(ranges.is_empty());
        assert_eq!(order, vec![0, 1, 3, 2]);
        assert!(is_valid(&order, &positions, &arcs));
    }

    #[test]
    fn test_ties_keep_relative_order() {
        let mut order = vec![4, 3, 2, 1, 0];
        let mut positions = vec![4, 3, 2, 1, 0];
        let mut ranges = vec![(0, 1), (3, 4), (1, 2)];
        repair_order(&mut order, &mut positions, &mut ranges, |_| 1.);
        assert_eq!(order, vec![4, 3, 2, 1, 0]);
        assert_eq!(positions, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_disjoint_ranges_sorted_separately() {
        let mut order = vec![0, 1, 2, 3, 4, 5];
        let mut positions = vec![0, 1, 2, 3, 4, 5];
        // node 2 sorts before node 1 and node 5 before node 4, node 3 stays put even
        // though its key is the smallest
        let keys = vec![0., 3., 2., -1., 9., 8.];
        let mut ranges = vec![(4, 5), (1, 2)];
        repair_order(&mut order, &mut positions, &mut ranges, |node| keys[node]);
        assert_eq!(order, vec![0, 2, 1, 3, 5, 4]);
        assert_eq!(positions, vec![0, 2, 1, 3, 5, 4]);
    }

    #[test]
    fn test_random_reversals_stay_sorted() {
        let mut rng = Isaac64Rng::seed_from_u64(37);
        for _ in 0..100 {
            let num_nodes = rng.gen_range(2..40);
            let mut order: Vec<NodeId> = (0..num_nodes).collect();
            order.shuffle(&mut rng);
            let mut positions = vec![0; num_nodes];
            for (pos, &node) in order.iter().enumerate() {
                positions[node] = pos;
            }
            // keys loosely follow the order, with many ties and some inversions
            let keys: Vec<f64> = (0..num_nodes)
                .map(|node| (positions[node] / 3 + rng.gen_range(0..3)) as f64)
                .collect();

            // arcs valid in the old order; those whose keys now decrease get reversed
            let mut arcs = vec![];
            let mut ranges = vec![];
            for (aa, bb) in order.clone().into_iter().tuple_combinations() {
                if !rng.gen_bool(0.2) {
                    continue;
                }
                if keys[aa] > keys[bb] {
                    arcs.push((bb, aa));
                    ranges.push((positions[aa], positions[bb]));
                } else {
                    arcs.push((aa, bb));
                }
            }

            repair_order(&mut order, &mut positions, &mut ranges, |node| keys[node]);
            assert!(is_valid(&order, &positions, &arcs));
        }
    }
}
