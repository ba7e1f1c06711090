//! Ordered element storage for one paragraph.
//!
//! The collection keeps two cumulative length tables in lockstep with its
//! elements: one in character space and one in unit space. Both start with
//! a leading zero, so `table[i]` is the offset where element `i` begins and
//! `table[len]` is the total length.
//!
//! Callers address the collection in character space. Edits first resolve
//! the character offset to an element boundary, splitting the element under
//! the offset when it can be cut there, and then splice whole elements.

use crate::element::{Bias, Element, Space};

/// Result of walking backwards from a position by a number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backtrack {
    /// The deletion fits; it starts at this character offset.
    Within(usize),
    /// The deletion runs past the start of the paragraph by this many units.
    Overflow(usize),
}

/// A run of elements detached from (or destined for) a collection.
///
/// The `cut_*` flags record that the run's first or last element is a piece
/// of an element that was split when the run was detached, so inserting the
/// run back where it came from restores the original element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSlice {
    /// Elements in order.
    pub elements: Vec<Element>,
    /// The first element was cut from a larger one.
    pub cut_start: bool,
    /// The last element was cut from a larger one.
    pub cut_end: bool,
}

impl ElementSlice {
    /// Wrap freshly created elements.
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            cut_start: false,
            cut_end: false,
        }
    }

    /// Total character length.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.elements.iter().map(Element::char_len).sum()
    }

    /// Total unit length.
    #[must_use]
    pub fn unit_len(&self) -> usize {
        self.elements.iter().map(Element::unit_len).sum()
    }

    /// Concatenated rendered text.
    #[must_use]
    pub fn render(&self) -> String {
        self.elements.iter().map(|e| e.render()).collect()
    }

    /// Whether the slice holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl From<Vec<Element>> for ElementSlice {
    fn from(elements: Vec<Element>) -> Self {
        Self::new(elements)
    }
}

/// Elements removed from a collection, with the offset they were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Character offset of the removed run after boundary snapping.
    pub start: usize,
    /// The removed run.
    pub slice: ElementSlice,
}

/// Where an inserted run landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Character offset of the first inserted character.
    pub start: usize,
    /// Character offset just past the inserted run.
    pub end: usize,
    /// An existing element was split to make room.
    pub split: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Boundary(usize),
    Inside { index: usize, offset: usize },
}

/// The ordered elements of one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementCollection {
    elements: Vec<Element>,
    char_table: Vec<usize>,
    unit_table: Vec<usize>,
}

impl Default for ElementCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            char_table: vec![0],
            unit_table: vec![0],
        }
    }

    /// Build a collection from existing elements.
    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut collection = Self {
            elements,
            char_table: vec![0],
            unit_table: vec![0],
        };
        collection.rebuild_from(0);
        collection
    }

    /// Elements in order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the collection holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total character length.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.char_table.last().copied().unwrap_or(0)
    }

    /// Total unit length.
    #[must_use]
    pub fn unit_len(&self) -> usize {
        self.unit_table.last().copied().unwrap_or(0)
    }

    /// Cumulative character lengths with a leading zero.
    #[must_use]
    pub fn char_table(&self) -> &[usize] {
        &self.char_table
    }

    /// Cumulative unit lengths with a leading zero.
    #[must_use]
    pub fn unit_table(&self) -> &[usize] {
        &self.unit_table
    }

    /// The paragraph's displayed text.
    #[must_use]
    pub fn render(&self) -> String {
        self.elements.iter().map(|e| e.render()).collect()
    }

    /// Index of the element containing character `pos`.
    #[must_use]
    pub fn element_index_at(&self, pos: usize) -> Option<usize> {
        if pos >= self.char_len() {
            return None;
        }
        let index = self.char_table.partition_point(|&x| x <= pos);
        Some(index - 1)
    }

    /// Index of the element that ends exactly at character `pos`.
    #[must_use]
    pub fn element_ending_at(&self, pos: usize) -> Option<usize> {
        match self.locate(Space::Chars, pos) {
            Location::Boundary(index) if index > 0 => Some(index - 1),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Coordinate translation
    // -----------------------------------------------------------------------

    /// Translate a position between character and unit space.
    ///
    /// A position on an element boundary maps to the same boundary in the
    /// target table. A position inside an element is rescaled by that
    /// element and clamped to its length in the target space. Positions past
    /// the end map to the end.
    #[must_use]
    pub fn translate(&self, from: Space, to: Space, pos: usize) -> usize {
        let target = self.table(to);
        match self.locate(from, pos) {
            Location::Boundary(index) => target[index],
            Location::Inside { index, offset } => {
                target[index] + self.elements[index].rescale(from, to, offset)
            }
        }
    }

    /// Character offset to unit offset.
    #[must_use]
    pub fn char_to_unit(&self, pos: usize) -> usize {
        self.translate(Space::Chars, Space::Units, pos)
    }

    /// Unit offset to character offset.
    #[must_use]
    pub fn unit_to_char(&self, pos: usize) -> usize {
        self.translate(Space::Units, Space::Chars, pos)
    }

    /// Find where a deletion of `units` backspaces ending at `pos` begins.
    ///
    /// Returns [`Backtrack::Overflow`] with the units left over when the
    /// paragraph holds fewer than `units` before `pos`.
    #[must_use]
    pub fn backtrack(&self, pos: usize, units: usize) -> Backtrack {
        let pos = pos.min(self.char_len());
        if units == 0 {
            return Backtrack::Within(pos);
        }
        let unit_pos = self.char_to_unit(pos);
        if units > unit_pos {
            Backtrack::Overflow(units - unit_pos)
        } else {
            Backtrack::Within(self.unit_to_char(unit_pos - units))
        }
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Copy the elements covering `start..end` without modifying the collection.
    #[must_use]
    pub fn extract(&self, start: usize, end: usize) -> ElementSlice {
        let end = end.min(self.char_len());
        if start >= end {
            return ElementSlice::default();
        }
        let first = match self.locate(Space::Chars, start) {
            Location::Boundary(index) | Location::Inside { index, .. } => index,
        };
        let last = match self.locate(Space::Chars, end) {
            Location::Boundary(index) => index,
            Location::Inside { index, .. } => index + 1,
        };
        let base = self.char_table[first];
        let mut window = Self::from_elements(self.elements[first..last].to_vec());
        window.remove(start - base, end - base).slice
    }

    /// Insert a run of elements at character `pos`.
    ///
    /// An element under `pos` is split first (positions inside elements that
    /// cannot be cut move to the element's start). Pieces flagged as cut in
    /// the slice are rejoined with their neighbours.
    pub fn insert(&mut self, pos: usize, slice: ElementSlice) -> Insertion {
        let pos = pos.min(self.char_len());
        let (index, split) = self.cut(pos, Bias::Start);
        let start = self.char_table[index];
        if slice.is_empty() {
            return Insertion {
                start,
                end: start,
                split,
            };
        }
        let count = slice.elements.len();
        let inserted = slice.char_len();
        self.elements.splice(index..index, slice.elements);

        let mut first = index;
        let mut last = index + count - 1;
        if slice.cut_start && first > 0 {
            if let Some(joined) = self.elements[first - 1].rejoin(&self.elements[first]) {
                self.elements[first - 1] = joined;
                self.elements.remove(first);
                first -= 1;
                last -= 1;
            }
        }
        if slice.cut_end && last + 1 < self.elements.len() {
            if let Some(joined) = self.elements[last].rejoin(&self.elements[last + 1]) {
                self.elements[last] = joined;
                self.elements.remove(last + 1);
            }
        }
        self.rebuild_from(first);
        Insertion {
            start,
            end: start + inserted,
            split,
        }
    }

    /// Detach the elements covering `start..end`.
    ///
    /// The range is widened so it never clips an atomic element or an
    /// affix. When both ends of the range fall inside the same element, the
    /// two remaining pieces are rejoined.
    pub fn remove(&mut self, start: usize, end: usize) -> Removal {
        let end = end.min(self.char_len());
        let start = start.min(end);
        if start == end {
            return Removal {
                start,
                slice: ElementSlice::default(),
            };
        }
        let same_element = matches!(
            (self.locate(Space::Chars, start), self.locate(Space::Chars, end)),
            (Location::Inside { index: a, .. }, Location::Inside { index: b, .. }) if a == b
        );
        let (first, cut_start) = self.cut(start, Bias::Start);
        let (last, cut_end) = self.cut(end, Bias::End);
        let removed_start = self.char_table[first];
        let elements: Vec<Element> = self.elements.drain(first..last).collect();

        if same_element && cut_start && cut_end && first > 0 && first < self.elements.len() {
            if let Some(joined) = self.elements[first - 1].rejoin(&self.elements[first]) {
                self.elements[first - 1] = joined;
                self.elements.remove(first);
            }
        }
        self.rebuild_from(first.saturating_sub(1));
        Removal {
            start: removed_start,
            slice: ElementSlice {
                elements,
                cut_start,
                cut_end,
            },
        }
    }

    /// Rejoin the two pieces meeting at character `pos` if they were split apart.
    ///
    /// Returns whether a join happened.
    pub fn heal(&mut self, pos: usize) -> bool {
        let Location::Boundary(index) = self.locate(Space::Chars, pos) else {
            return false;
        };
        if index == 0 || index >= self.elements.len() {
            return false;
        }
        match self.elements[index - 1].rejoin(&self.elements[index]) {
            Some(joined) => {
                self.elements[index - 1] = joined;
                self.elements.remove(index);
                self.rebuild_from(index - 1);
                true
            }
            None => false,
        }
    }

    /// Split the collection at character `pos`, returning the tail.
    ///
    /// The second value reports whether an element was cut in two.
    pub fn split_off(&mut self, pos: usize) -> (Self, bool) {
        let (index, split) = self.cut(pos.min(self.char_len()), Bias::Start);
        let tail = self.elements.split_off(index);
        self.rebuild_from(index);
        (Self::from_elements(tail), split)
    }

    /// Remove and return the elements from `index` on.
    pub fn truncate(&mut self, index: usize) -> Vec<Element> {
        let index = index.min(self.elements.len());
        let tail = self.elements.split_off(index);
        self.rebuild_from(index);
        tail
    }

    /// Append elements at the end.
    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) {
        let from = self.elements.len();
        self.elements.extend(elements);
        self.rebuild_from(from);
    }

    /// Append one element at the end.
    pub fn push(&mut self, element: Element) {
        self.extend(std::iter::once(element));
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<Element> {
        let element = self.elements.pop()?;
        self.rebuild_from(self.elements.len());
        Some(element)
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<Element> {
        if self.elements.is_empty() {
            return None;
        }
        let element = self.elements.remove(0);
        self.rebuild_from(0);
        Some(element)
    }

    /// Insert one element at the front.
    pub fn push_front(&mut self, element: Element) {
        self.elements.insert(0, element);
        self.rebuild_from(0);
    }

    /// Replace the element at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, element: Element) -> Option<Element> {
        let slot = self.elements.get_mut(index)?;
        let old = std::mem::replace(slot, element);
        self.rebuild_from(index);
        Some(old)
    }

    /// Rewrite elements in place; returns how many the closure changed.
    ///
    /// The closure returns `true` when it modified the element.
    pub fn update_each<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&mut Element) -> bool,
    {
        let mut first_changed = None;
        let mut changed = 0;
        for (index, element) in self.elements.iter_mut().enumerate() {
            if f(element) {
                changed += 1;
                first_changed.get_or_insert(index);
            }
        }
        if let Some(index) = first_changed {
            self.rebuild_from(index);
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn table(&self, space: Space) -> &[usize] {
        match space {
            Space::Chars => &self.char_table,
            Space::Units => &self.unit_table,
        }
    }

    /// Binary search for `pos` in the table of `space`.
    ///
    /// On runs of zero-width elements the first matching boundary wins.
    fn locate(&self, space: Space, pos: usize) -> Location {
        let table = self.table(space);
        let total = table.last().copied().unwrap_or(0);
        if pos >= total {
            return Location::Boundary(self.elements.len());
        }
        let index = table.partition_point(|&x| x < pos);
        if table[index] == pos {
            Location::Boundary(index)
        } else {
            Location::Inside {
                index: index - 1,
                offset: pos - table[index - 1],
            }
        }
    }

    /// Make sure an element boundary exists at character `pos`.
    ///
    /// Returns the boundary index and whether an element was split.
    fn cut(&mut self, pos: usize, bias: Bias) -> (usize, bool) {
        match self.locate(Space::Chars, pos) {
            Location::Boundary(index) => (index, false),
            Location::Inside { index, offset } => {
                let element = &self.elements[index];
                let snapped = element.snap(offset, bias);
                if snapped == 0 {
                    return (index, false);
                }
                if snapped >= element.char_len() {
                    return (index + 1, false);
                }
                match element.split_at(snapped) {
                    Some((left, right)) => {
                        self.elements[index] = left;
                        self.elements.insert(index + 1, right);
                        self.rebuild_from(index);
                        (index + 1, true)
                    }
                    None => (index, false),
                }
            }
        }
    }

    fn rebuild_from(&mut self, index: usize) {
        let index = index.min(self.elements.len());
        self.char_table.truncate(index + 1);
        self.unit_table.truncate(index + 1);
        let mut chars = self.char_table[index];
        let mut units = self.unit_table[index];
        for element in &self.elements[index..] {
            chars += element.char_len();
            units += element.unit_len();
            self.char_table.push(chars);
            self.unit_table.push(units);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(outline: &str, data: &str) -> Element {
        Element::stroke(outline, data, "t0", None)
    }

    fn sample() -> ElementCollection {
        ElementCollection::from_elements(vec![
            stroke("THE", "The"),
            stroke("S-P", " "),
            Element::field("WITNESS", "Smith", "t1"),
            stroke("SAEUD", " said"),
        ])
    }

    #[test]
    fn test_tables_in_lockstep() {
        let collection = sample();
        assert_eq!(collection.char_table(), &[0, 3, 4, 9, 14]);
        assert_eq!(collection.unit_table(), &[0, 3, 4, 5, 10]);
        assert_eq!(collection.render(), "The Smith said");
        assert_eq!(collection.char_len(), collection.render().chars().count());
    }

    #[test]
    fn test_translate_clamps_inside_atomic() {
        let collection = sample();
        assert_eq!(collection.char_to_unit(4), 4);
        for pos in 5..=9 {
            assert_eq!(collection.char_to_unit(pos), 5, "char {pos}");
        }
        assert_eq!(collection.unit_to_char(5), 9);
        assert_eq!(collection.unit_to_char(4), 4);
        assert_eq!(collection.char_to_unit(100), 10);
    }

    #[test]
    fn test_backtrack_deletes_atomic_as_one_unit() {
        let collection = sample();
        assert_eq!(collection.backtrack(14, 5), Backtrack::Within(9));
        assert_eq!(collection.backtrack(14, 6), Backtrack::Within(4));
        assert_eq!(collection.backtrack(14, 10), Backtrack::Within(0));
        assert_eq!(collection.backtrack(14, 13), Backtrack::Overflow(3));
        assert_eq!(collection.backtrack(7, 0), Backtrack::Within(7));
    }

    #[test]
    fn test_automatic_prefix_removed_with_inner_text() {
        let mut collection =
            ElementCollection::from_elements(vec![Element::automatic("Q.\t", "ABC", "", "t0")]);
        assert_eq!(collection.char_len(), 6);
        assert_eq!(collection.unit_len(), 3);

        assert_eq!(collection.backtrack(6, 1), Backtrack::Within(5));
        assert_eq!(collection.backtrack(6, 3), Backtrack::Within(0));

        let removal = collection.remove(0, 6);
        assert_eq!(removal.slice.elements.len(), 1);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_partial_automatic_removal_keeps_prefix() {
        let mut collection =
            ElementCollection::from_elements(vec![Element::automatic("Q.\t", "ABC", "", "t0")]);
        let removal = collection.remove(5, 6);
        assert_eq!(removal.slice.render(), "C");
        assert_eq!(collection.render(), "Q.\tAB");
        collection.insert(removal.start, removal.slice);
        assert_eq!(
            collection.elements(),
            &[Element::automatic("Q.\t", "ABC", "", "t0")]
        );
    }

    #[test]
    fn test_remove_widens_over_atomic() {
        let mut collection = sample();
        let removal = collection.remove(6, 7);
        assert_eq!(removal.start, 4);
        assert_eq!(removal.slice.render(), "Smith");
        assert_eq!(collection.render(), "The  said");
    }

    #[test]
    fn test_remove_inside_element_rejoins_remnants() {
        let mut collection = ElementCollection::from_elements(vec![stroke("ABGD", "ABCDEF")]);
        let removal = collection.remove(2, 4);
        assert_eq!(removal.slice.render(), "CD");
        assert!(removal.slice.cut_start && removal.slice.cut_end);
        assert_eq!(collection.element_count(), 1);
        assert_eq!(collection.render(), "ABEF");

        collection.insert(removal.start, removal.slice);
        assert_eq!(collection.elements(), &[stroke("ABGD", "ABCDEF")]);
    }

    #[test]
    fn test_remove_across_elements_round_trip() {
        let original = sample();
        let mut collection = original.clone();
        let removal = collection.remove(1, 12);
        assert_eq!(collection.render(), "Tid");
        collection.insert(removal.start, removal.slice);
        assert_eq!(collection, original);
    }

    #[test]
    fn test_insert_splits_element() {
        let mut collection = ElementCollection::from_elements(vec![stroke("ABGD", "ABCDEF")]);
        let insertion = collection.insert(3, vec![Element::text("X", "t1")].into());
        assert_eq!(insertion.start, 3);
        assert_eq!(insertion.end, 4);
        assert!(insertion.split);
        assert_eq!(collection.render(), "ABCXDEF");
        assert_eq!(collection.element_count(), 3);

        collection.remove(insertion.start, insertion.end);
        assert!(collection.heal(insertion.start));
        assert_eq!(collection.elements(), &[stroke("ABGD", "ABCDEF")]);
    }

    #[test]
    fn test_insert_inside_atomic_moves_to_start() {
        let mut collection = sample();
        let insertion = collection.insert(6, vec![Element::text("Mr. ", "t2")].into());
        assert_eq!(insertion.start, 4);
        assert_eq!(collection.render(), "The Mr. Smith said");
    }

    #[test]
    fn test_extract_leaves_collection_untouched() {
        let collection = sample();
        let slice = collection.extract(1, 6);
        assert_eq!(slice.render(), "he Smith");
        assert!(slice.cut_start);
        assert!(!slice.cut_end);
        assert_eq!(collection, sample());
    }

    #[test]
    fn test_split_off() {
        let mut collection = ElementCollection::from_elements(vec![stroke("ABGD", "ABCDEF")]);
        let (tail, split) = collection.split_off(3);
        assert!(split);
        assert_eq!(collection.render(), "ABC");
        assert_eq!(tail.render(), "DEF");
    }

    #[test]
    fn test_update_each_rebuilds_tables() {
        let mut collection = sample();
        let changed = collection.update_each(|element| {
            if matches!(element.kind, crate::element::ElementKind::Field { .. }) {
                element.data = "Jones-Smith".to_string();
                true
            } else {
                false
            }
        });
        assert_eq!(changed, 1);
        assert_eq!(collection.char_len(), 20);
        assert_eq!(collection.unit_len(), 10);
    }
}
