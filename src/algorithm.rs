use std::cmp::Ordering;

/// Sorting strategy used when a pool is reordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortAlgorithm {
    /// `slice::sort_by`.
    Stable,
    /// `slice::sort_unstable_by`.
    #[default]
    Unstable,
    /// Plain insertion sort, good for nearly sorted pools.
    Insertion,
}

/// Sorts `0..len` by `compare` and returns the resulting order: position `i`
/// of the result holds the old position of the element that belongs at `i`.
pub fn sort_positions<C>(len: usize, algorithm: SortAlgorithm, mut compare: C) -> Vec<usize>
where
    C: FnMut(usize, usize) -> Ordering,
{
    let mut order: Vec<usize> = (0..len).collect();

    match algorithm {
        SortAlgorithm::Stable => order.sort_by(|&a, &b| compare(a, b)),
        SortAlgorithm::Unstable => order.sort_unstable_by(|&a, &b| compare(a, b)),
        SortAlgorithm::Insertion => insertion_sort(&mut order, |&a, &b| compare(a, b)),
    }

    order
}

pub fn insertion_sort<T, C>(values: &mut [T], mut compare: C)
where
    C: FnMut(&T, &T) -> Ordering,
{
    for i in 1..values.len() {
        let mut j = i;

        while j > 0 && compare(&values[j - 1], &values[j]) == Ordering::Greater {
            values.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_sort_is_stable() {
        let mut values = vec![(3, 'a'), (1, 'b'), (3, 'c'), (2, 'd'), (1, 'e')];
        insertion_sort(&mut values, |a, b| a.0.cmp(&b.0));
        assert_eq!(values, vec![(1, 'b'), (1, 'e'), (2, 'd'), (3, 'a'), (3, 'c')]);
    }

    #[test]
    fn test_sort_positions_all_algorithms() {
        let keys = [40, 10, 30, 20];

        for algorithm in [SortAlgorithm::Stable, SortAlgorithm::Unstable, SortAlgorithm::Insertion] {
            let order = sort_positions(keys.len(), algorithm, |a, b| keys[a].cmp(&keys[b]));
            assert_eq!(order, vec![1, 3, 2, 0], "{:?}", algorithm);
        }
    }
}
