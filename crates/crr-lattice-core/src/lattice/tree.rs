use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Triangular arena for a recombining lattice.
///
/// Row `i` holds the `i + 1` nodes of step `i`, indexed by up-count `j`, so
/// every stored node satisfies `0 <= j <= i`. Rows are appended in step order
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triangular<T> {
    rows: Vec<Vec<T>>,
}

impl<T> Triangular<T> {
    pub(crate) fn with_steps(steps: usize) -> Self {
        Triangular {
            rows: Vec::with_capacity(steps + 1),
        }
    }

    /// Append the row for the next step. The row length must be `step + 1`.
    pub(crate) fn push_row(&mut self, row: Vec<T>) {
        debug_assert_eq!(row.len(), self.rows.len() + 1);
        self.rows.push(row);
    }

    /// Build from rows collected in reverse step order (maturity first).
    pub(crate) fn from_reversed_rows(mut rows: Vec<Vec<T>>) -> Self {
        rows.reverse();
        debug_assert!(rows.iter().enumerate().all(|(i, r)| r.len() == i + 1));
        Triangular { rows }
    }

    /// Number of steps N (the last step index).
    pub fn steps(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Total stored nodes, (N+1)(N+2)/2.
    pub fn node_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn get(&self, step: usize, up_count: usize) -> Option<&T> {
        self.rows.get(step).and_then(|row| row.get(up_count))
    }

    pub fn row(&self, step: usize) -> Option<&[T]> {
        self.rows.get(step).map(Vec::as_slice)
    }

    /// Node (0, 0).
    pub fn root(&self) -> Option<&T> {
        self.get(0, 0)
    }

    /// Nodes in step order, up-count ascending within each step.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, v)| ((i, j), v)))
    }
}

impl<T> Index<(usize, usize)> for Triangular<T> {
    type Output = T;

    fn index(&self, (step, up_count): (usize, usize)) -> &T {
        &self.rows[step][up_count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Triangular<u32> {
        let mut t = Triangular::with_steps(2);
        t.push_row(vec![1]);
        t.push_row(vec![2, 3]);
        t.push_row(vec![4, 5, 6]);
        t
    }

    #[test]
    fn test_shape_and_lookup() {
        let t = sample();
        assert_eq!(t.steps(), 2);
        assert_eq!(t.node_count(), 6);
        assert_eq!(t.root(), Some(&1));
        assert_eq!(t.get(2, 1), Some(&5));
        assert_eq!(t[(1, 1)], 3);
    }

    #[test]
    fn test_out_of_triangle_is_none() {
        let t = sample();
        assert_eq!(t.get(1, 2), None);
        assert_eq!(t.get(3, 0), None);
        assert!(t.row(3).is_none());
    }

    #[test]
    fn test_iter_order() {
        let t = sample();
        let keys: Vec<(usize, usize)> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![(0, 0), (1, 0), (1, 1), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn test_from_reversed_rows() {
        let t = Triangular::from_reversed_rows(vec![vec![4, 5, 6], vec![2, 3], vec![1]]);
        assert_eq!(t, sample());
    }
}
