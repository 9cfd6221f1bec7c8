//! Inline decorations and the position-mapped set that holds them.

use crate::annotation::{DecorationPayload, Match, Severity};
use crate::mapping::{Bias, Mapping};
use crate::remap::DocRange;

/// An inline underline over a document range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub range: DocRange,
    pub severity: Severity,
    pub tooltip: String,
    pub payload: DecorationPayload,
}

impl Decoration {
    pub fn from_match(m: &Match, range: DocRange) -> Self {
        Self {
            range,
            severity: m.severity,
            tooltip: m.tooltip().to_string(),
            payload: m.payload(),
        }
    }

    /// Full style class list, e.g. `lt-underline lt-spelling`.
    pub fn class(&self) -> String {
        format!("lt-underline {}", self.severity.class_name())
    }
}

/// Decorations sorted by range, carried forward through document edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> + '_ {
        self.decorations.iter()
    }

    /// Carry every decoration through `mapping`.
    ///
    /// Text inserted at either edge of a decoration stays outside it.
    /// Decorations whose range collapses are dropped.
    pub fn map(&self, mapping: &Mapping) -> Self {
        if mapping.is_empty() {
            return self.clone();
        }
        let decorations = self
            .decorations
            .iter()
            .filter_map(|deco| {
                let range = DocRange::new(
                    mapping.map_pos(deco.range.from, Bias::Right),
                    mapping.map_pos(deco.range.to, Bias::Left),
                );
                (!range.is_empty()).then(|| Decoration {
                    range,
                    ..deco.clone()
                })
            })
            .collect();
        Self { decorations }
    }

    /// Decorations lying entirely within `range`.
    pub fn find(&self, range: DocRange) -> impl Iterator<Item = &Decoration> + '_ {
        self.decorations
            .iter()
            .filter(move |deco| range.contains_range(&deco.range))
    }

    /// Remove every decoration lying entirely within `range`. Returns how
    /// many were removed.
    pub fn remove_within(&mut self, range: DocRange) -> usize {
        let before = self.decorations.len();
        self.decorations
            .retain(|deco| !range.contains_range(&deco.range));
        before - self.decorations.len()
    }

    /// Add decorations, keeping the set sorted. Empty ranges are ignored.
    pub fn add(&mut self, decorations: impl IntoIterator<Item = Decoration>) {
        self.decorations
            .extend(decorations.into_iter().filter(|deco| !deco.range.is_empty()));
        self.decorations.sort_by_key(|deco| deco.range);
    }

    /// The first decoration covering `pos`.
    pub fn at(&self, pos: usize) -> Option<&Decoration> {
        self.decorations.iter().find(|deco| deco.range.contains(pos))
    }

    pub fn clear(&mut self) {
        self.decorations.clear();
    }
}

impl FromIterator<Decoration> for DecorationSet {
    fn from_iter<I: IntoIterator<Item = Decoration>>(iter: I) -> Self {
        let mut set = Self::empty();
        set.add(iter);
        set
    }
}
