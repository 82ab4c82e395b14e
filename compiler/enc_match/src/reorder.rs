//! Sibling order comparison.

/// Mark the members of one longest strictly increasing subsequence of
/// `positions`.
///
/// `positions[i]` is the new position of the `i`-th matched sibling in old
/// order. Siblings outside the subsequence are the ones reported as
/// reordered; keeping the longest run in place reports the fewest moves.
pub(crate) fn stable_positions(positions: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; positions.len()];

    for (i, &position) in positions.iter().enumerate() {
        let slot = tails.partition_point(|&t| positions[t] < position);
        if slot > 0 {
            prev[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut stable = vec![false; positions.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        stable[i] = true;
        cursor = prev[i];
    }
    stable
}
