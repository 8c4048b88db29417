//! Similarity measures over strings and sequences of context elements.
//!
//! Sequences are compared with a weighted Wagner–Fischer edit distance:
//! substituting `a` by `b` costs `1 - sim(a, b)` and inserting or deleting an
//! element costs its priority. The distance is normalised into a similarity
//! in `[0, 1]`.

pub mod assignment;
mod elements;

#[cfg(test)]
mod tests;

/// Values that can be compared to each other with a score in `[0, 1]`
pub trait Similar: PartialEq {
    /// Similarity to `other` in `[0, 1]`
    fn similarity(&self, other: &Self) -> f64;

    /// Cost of inserting or deleting this value inside a sequence
    fn priority(&self) -> f64 {
        1.0
    }
}

/// Elements whose sequences are normalised by structural groups
pub trait Grouped: Similar {
    /// Whether both elements have the same structure, values ignored
    fn structurally_equal(&self, other: &Self) -> bool;
}

/// Character edit-distance similarity `1 - distance / max_len`
pub fn string_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = edit_distance::edit_distance(a, b);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Similarity of two sequences normalised by the longer length
pub fn sequence_similarity<T: Similar>(a: &[T], b: &[T]) -> f64 {
    if let Some(score) = degenerate(a, b) {
        return score;
    }

    let denominator = a.len().max(b.len()) as f64;
    normalise(edit_cost(a, b), denominator)
}

/// Similarity of two sequences normalised by structural groups
///
/// The denominator is the priority sum of every element of `a` plus the
/// priorities of the elements of `b` left over once structurally equal groups
/// of both sides have been paired count for count.
pub fn grouped_sequence_similarity<T: Grouped>(a: &[T], b: &[T]) -> f64 {
    if let Some(score) = degenerate(a, b) {
        return score;
    }

    normalise(edit_cost(a, b), grouped_denominator(a, b))
}

fn degenerate<T>(a: &[T], b: &[T]) -> Option<f64> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Some(1.0),
        (true, false) | (false, true) => Some(0.0),
        _ => None,
    }
}

fn normalise(cost: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return if cost <= 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - cost / denominator).clamp(0.0, 1.0)
}

/// Representative element and count of every structural group, in order of
/// first appearance
fn groups<T: Grouped>(items: &[T]) -> Vec<(&T, usize)> {
    let mut groups: Vec<(&T, usize)> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|(representative, _)| representative.structurally_equal(item))
        {
            Some(group) => group.1 += 1,
            None => groups.push((item, 1)),
        }
    }
    groups
}

pub(crate) fn grouped_denominator<T: Grouped>(a: &[T], b: &[T]) -> f64 {
    let mut leftover = groups(b);

    for (representative, count) in groups(a) {
        if let Some(group) = leftover
            .iter_mut()
            .find(|(other, _)| other.structurally_equal(representative))
        {
            group.1 = group.1.saturating_sub(count);
        }
    }

    let own: f64 = a.iter().map(Similar::priority).sum();
    let unpaired: f64 = leftover
        .into_iter()
        .map(|(representative, count)| representative.priority() * count as f64)
        .sum();

    own + unpaired
}

/// Weighted edit distance after stripping the common prefix and suffix
pub(crate) fn edit_cost<T: Similar>(a: &[T], b: &[T]) -> f64 {
    let prefix = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    let mut previous: Vec<f64> = Vec::with_capacity(b.len() + 1);
    previous.push(0.0);
    for item in b {
        let last = previous[previous.len() - 1];
        previous.push(last + item.priority());
    }
    let mut current = vec![0.0; b.len() + 1];

    for x in a {
        current[0] = previous[0] + x.priority();
        for (j, y) in b.iter().enumerate() {
            let delete = previous[j + 1] + x.priority();
            let insert = current[j] + y.priority();
            let substitute = previous[j] + (1.0 - x.similarity(y));
            current[j + 1] = delete.min(insert).min(substitute);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

impl Similar for char {
    fn similarity(&self, other: &Self) -> f64 {
        if self == other {
            1.0
        } else {
            0.0
        }
    }
}

impl Similar for String {
    fn similarity(&self, other: &Self) -> f64 {
        string_similarity(self, other)
    }
}
