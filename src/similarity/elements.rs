use super::{grouped_sequence_similarity, string_similarity, Grouped, Similar};
use crate::context::{AncestorsContextElement, HeaderContextElement, TextOrHash};

impl Similar for HeaderContextElement {
    fn similarity(&self, other: &Self) -> f64 {
        if !self.equals_ignore_value(other) {
            return 0.0;
        }

        if self.exact_match {
            if self.value == other.value {
                1.0
            } else {
                0.0
            }
        } else {
            string_similarity(&self.joined_value(), &other.joined_value())
        }
    }

    fn priority(&self) -> f64 {
        self.priority
    }
}

impl Grouped for HeaderContextElement {
    fn structurally_equal(&self, other: &Self) -> bool {
        self.equals_ignore_value(other)
    }
}

impl Similar for AncestorsContextElement {
    fn similarity(&self, other: &Self) -> f64 {
        if self.kind != other.kind {
            return 0.0;
        }
        grouped_sequence_similarity(&self.header, &other.header)
    }
}

impl Grouped for AncestorsContextElement {
    fn structurally_equal(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Similar for TextOrHash {
    fn similarity(&self, other: &Self) -> f64 {
        self.compare(other)
    }
}
