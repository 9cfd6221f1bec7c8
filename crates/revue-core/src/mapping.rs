//! Position mapping through document edits.
//!
//! Every edit step produces a [`StepMap`] describing which ranges of the old
//! document were replaced and how large the replacements are. A [`Mapping`]
//! chains step maps in edit order so that a position recorded against an
//! older document can be carried forward to the current one.

/// How a position sitting exactly on an insertion point is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Stay before content inserted at this position.
    Left,
    /// Move after content inserted at this position.
    Right,
}

/// Result of mapping a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    /// The position in the new document.
    pub pos: usize,
    /// True when the original position was strictly inside a replaced range.
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChangedRange {
    start: usize,
    old_size: usize,
    new_size: usize,
}

/// The position map of one edit step.
///
/// Ranges are expressed in the coordinates of the document *before* the
/// step, sorted by start and non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<ChangedRange>,
}

impl StepMap {
    /// A map that leaves every position where it is.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A map replacing `old_size` positions at `start` with `new_size` positions.
    pub fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::identity();
        }
        Self {
            ranges: vec![ChangedRange {
                start,
                old_size,
                new_size,
            }],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Map `pos` through this step.
    ///
    /// A position on the edge of a replaced range sticks to that edge; a
    /// position on a pure insertion point follows `bias`.
    pub fn map(&self, pos: usize, bias: Bias) -> MapResult {
        let mut diff: isize = 0;
        for r in &self.ranges {
            if r.start > pos {
                break;
            }
            let end = r.start + r.old_size;
            if pos <= end {
                let side = if r.old_size == 0 {
                    bias
                } else if pos == r.start {
                    Bias::Left
                } else if pos == end {
                    Bias::Right
                } else {
                    bias
                };
                let base = offset(r.start, diff);
                let mapped = match side {
                    Bias::Left => base,
                    Bias::Right => base + r.new_size,
                };
                let deleted = r.old_size > 0 && pos != r.start && pos != end;
                return MapResult {
                    pos: mapped,
                    deleted,
                };
            }
            diff += r.new_size as isize - r.old_size as isize;
        }
        MapResult {
            pos: offset(pos, diff),
            deleted: false,
        }
    }

    /// Positions marking every changed range, in post-step coordinates:
    /// both edges, plus the first and last inner position when the new
    /// content spans at least two positions. An inserted block has only
    /// boundary tokens at its edges, so the inner positions are what land
    /// inside its text.
    fn touched(&self) -> Vec<(usize, Bias)> {
        let mut diff: isize = 0;
        let mut out = Vec::with_capacity(self.ranges.len() * 4);
        for r in &self.ranges {
            let start = offset(r.start, diff);
            let end = start + r.new_size;
            out.push((start, Bias::Left));
            if r.new_size >= 2 {
                out.push((start + 1, Bias::Left));
                out.push((end - 1, Bias::Right));
            }
            out.push((end, Bias::Right));
            diff += r.new_size as isize - r.old_size as isize;
        }
        out
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    (pos as isize + diff).max(0) as usize
}

/// An ordered chain of step maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        if !map.is_identity() {
            self.maps.push(map);
        }
    }

    /// Append every step of `other` after the steps already held.
    pub fn append(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    /// True when no step changes any position.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Map `pos` through every step in order.
    pub fn map(&self, pos: usize, bias: Bias) -> MapResult {
        self.map_from(0, pos, bias)
    }

    pub fn map_pos(&self, pos: usize, bias: Bias) -> usize {
        self.map(pos, bias).pos
    }

    fn map_from(&self, first: usize, pos: usize, bias: Bias) -> MapResult {
        let mut result = MapResult {
            pos,
            deleted: false,
        };
        for map in &self.maps[first..] {
            let step = map.map(result.pos, bias);
            result.pos = step.pos;
            result.deleted |= step.deleted;
        }
        result
    }

    /// Positions marking every range changed by this mapping, expressed in
    /// the coordinates of the final document.
    pub fn touched_positions(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for (i, map) in self.maps.iter().enumerate() {
            for (pos, bias) in map.touched() {
                out.push(self.map_from(i + 1, pos, bias).pos);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

impl From<StepMap> for Mapping {
    fn from(map: StepMap) -> Self {
        let mut mapping = Mapping::new();
        mapping.push(map);
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_before_change_are_untouched() {
        let map = StepMap::replace(10, 2, 5);
        assert_eq!(map.map(4, Bias::Left).pos, 4);
        assert_eq!(map.map(10, Bias::Right).pos, 10);
    }

    #[test]
    fn positions_after_change_shift() {
        let map = StepMap::replace(10, 2, 5);
        assert_eq!(map.map(12, Bias::Left).pos, 15);
        assert_eq!(map.map(20, Bias::Left).pos, 23);

        let shrink = StepMap::replace(10, 4, 0);
        assert_eq!(shrink.map(20, Bias::Right).pos, 16);
    }

    #[test]
    fn insertion_point_follows_bias() {
        let map = StepMap::replace(5, 0, 3);
        assert_eq!(map.map(5, Bias::Left).pos, 5);
        assert_eq!(map.map(5, Bias::Right).pos, 8);
    }

    #[test]
    fn inside_replaced_range_is_deleted() {
        let map = StepMap::replace(5, 4, 1);
        let left = map.map(7, Bias::Left);
        assert!(left.deleted);
        assert_eq!(left.pos, 5);
        let right = map.map(7, Bias::Right);
        assert_eq!(right.pos, 6);
        assert!(!map.map(5, Bias::Right).deleted);
        assert!(!map.map(9, Bias::Left).deleted);
    }

    #[test]
    fn mapping_chains_steps_in_order() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::replace(2, 0, 3)); // insert 3 at 2
        mapping.push(StepMap::replace(0, 1, 0)); // delete first char
        assert_eq!(mapping.map_pos(10, Bias::Left), 12);
        assert_eq!(mapping.map_pos(1, Bias::Left), 0);
    }

    #[test]
    fn identity_steps_are_dropped() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::replace(3, 0, 0));
        assert!(mapping.is_empty());
    }

    #[test]
    fn touched_positions_are_in_final_coordinates() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::replace(10, 0, 2)); // insert at 10 -> touched 10, 11, 12
        mapping.push(StepMap::replace(0, 0, 5)); // insert at 0 shifts the earlier edit
        assert_eq!(mapping.touched_positions(), vec![0, 1, 4, 5, 15, 16, 17]);
    }

    #[test]
    fn single_char_insert_marks_only_edges() {
        let mapping = Mapping::from(StepMap::replace(4, 0, 1));
        assert_eq!(mapping.touched_positions(), vec![4, 5]);
    }
}
