use std::fmt;

use crate::error::{Error, Result};

/// Half-open byte range `[start, end)` in a file's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this range
    pub const fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether `offset` lies inside the range, end inclusive
    pub const fn contains_inclusive(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Whether two ranges share at least one byte, or touch when either is empty
    pub const fn touches(&self, other: TextRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Sum of the absolute distances between the two starts and the two ends
    pub fn distance(&self, other: TextRange) -> usize {
        self.start.abs_diff(other.start) + self.end.abs_diff(other.end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A textual substitution: bytes `[start, end)` become `new_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub new_len: usize,
}

impl TextEdit {
    pub const fn new(start: usize, end: usize, new_len: usize) -> Self {
        Self {
            start,
            end,
            new_len,
        }
    }

    pub const fn insert(at: usize, len: usize) -> Self {
        Self::new(at, at, len)
    }

    /// Net change in text length
    pub fn delta(&self) -> isize {
        self.new_len as isize - (self.end - self.start) as isize
    }

    pub const fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    pub const fn old_range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }

    pub const fn new_range(&self) -> TextRange {
        TextRange::new(self.start, self.start + self.new_len)
    }
}

impl fmt::Display for TextEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} => {}", self.start, self.end, self.new_len)
    }
}

/// One literal replacement in a file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

impl Replacement {
    pub fn new(start: usize, end: usize, new_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            new_text: new_text.into(),
        }
    }

    pub fn insert(at: usize, new_text: impl Into<String>) -> Self {
        Self::new(at, at, new_text)
    }

    pub fn edit(&self) -> TextEdit {
        TextEdit::new(self.start, self.end, self.new_text.len())
    }
}

/// Where a node range sits relative to an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
    Contains,
    Overlaps,
}

/// Classify `range` against `edit`.
///
/// For a pure insertion at `p` a range starting at or after `p` is after it
/// and a range ending at or before `p` is before it; only ranges strictly
/// around `p` contain it. Callers that know a node encloses an insertion
/// made at its boundary use [`grow`] instead.
pub fn classify(range: TextRange, edit: &TextEdit) -> Placement {
    if edit.is_insertion() {
        let p = edit.start;
        if range.start >= p {
            Placement::After
        } else if range.end <= p {
            Placement::Before
        } else {
            Placement::Contains
        }
    } else if range.end <= edit.start {
        Placement::Before
    } else if range.start >= edit.end {
        Placement::After
    } else if range.start <= edit.start && edit.end <= range.end {
        Placement::Contains
    } else {
        Placement::Overlaps
    }
}

fn offset(pos: usize, delta: isize) -> usize {
    pos.saturating_add_signed(delta)
}

/// Adjust one range for `edit`.
pub fn shift_range(range: TextRange, edit: &TextEdit) -> Result<TextRange> {
    let delta = edit.delta();
    match classify(range, edit) {
        Placement::Before => Ok(range),
        Placement::After => Ok(TextRange::new(
            offset(range.start, delta),
            offset(range.end, delta),
        )),
        Placement::Contains => Ok(TextRange::new(range.start, offset(range.end, delta))),
        Placement::Overlaps => Err(Error::overlap(range, *edit)),
    }
}

/// Adjust a range known to enclose the edit: only its end moves.
pub fn grow(range: TextRange, edit: &TextEdit) -> Result<TextRange> {
    if !range.contains_range(edit.old_range()) {
        return Err(Error::overlap(range, *edit));
    }
    Ok(TextRange::new(range.start, offset(range.end, edit.delta())))
}

/// Adjust every range in `ranges` for `edit`.
///
/// Fails without touching any range when one of them partially overlaps.
pub fn shift(ranges: &mut [TextRange], edit: &TextEdit) -> Result<()> {
    let shifted = ranges
        .iter()
        .map(|range| shift_range(*range, edit))
        .collect::<Result<Vec<_>>>()?;
    ranges.copy_from_slice(&shifted);
    Ok(())
}

/// Fold `edits` (descending start order) over one range.
pub fn shift_through(range: TextRange, edits: &[TextEdit]) -> Result<TextRange> {
    edits
        .iter()
        .try_fold(range, |range, edit| shift_range(range, edit))
}

/// Fold `edits` (descending start order) over an enclosing range.
pub fn grow_through(range: TextRange, edits: &[TextEdit]) -> Result<TextRange> {
    edits.iter().try_fold(range, |range, edit| grow(range, edit))
}

/// Sort replacements by descending start and reject overlapping ones.
pub fn sort_replacements(replacements: &mut [Replacement]) -> Result<()> {
    replacements.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    for pair in replacements.windows(2) {
        let (right, left) = (&pair[0], &pair[1]);
        if left.end > right.start || (left.start == right.start && left.end == right.end) {
            return Err(Error::invalid_range(
                left.start,
                right.end,
                "replacements overlap",
            ));
        }
    }
    Ok(())
}

/// Apply replacements right-to-left so earlier offsets stay valid.
///
/// `replacements` must already be in descending start order.
pub fn apply_replacements(text: &mut String, replacements: &[Replacement]) -> Result<()> {
    for replacement in replacements {
        if replacement.start > replacement.end || replacement.end > text.len() {
            return Err(Error::invalid_range(
                replacement.start,
                replacement.end,
                format!("outside text of length {}", text.len()),
            ));
        }
        if !text.is_char_boundary(replacement.start) || !text.is_char_boundary(replacement.end) {
            return Err(Error::invalid_range(
                replacement.start,
                replacement.end,
                "not on a character boundary",
            ));
        }
    }
    for replacement in replacements {
        text.replace_range(replacement.start..replacement.end, &replacement.new_text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_shift_replacement_grows_edited_node_and_moves_followers() {
        // "aaa bbb ccc" with "bbb" replaced by "longer"
        let mut ranges = vec![
            TextRange::new(0, 3),
            TextRange::new(4, 7),
            TextRange::new(8, 11),
        ];
        shift(&mut ranges, &TextEdit::new(4, 7, 6)).unwrap();
        assert_eq!(
            ranges,
            vec![
                TextRange::new(0, 3),
                TextRange::new(4, 10),
                TextRange::new(11, 14),
            ]
        );
    }

    #[test]
    fn test_shift_deletion() {
        let mut ranges = vec![TextRange::new(0, 20), TextRange::new(30, 40)];
        shift(&mut ranges, &TextEdit::new(5, 10, 0)).unwrap();
        assert_eq!(ranges, vec![TextRange::new(0, 15), TextRange::new(25, 35)]);
    }

    #[test]
    fn test_shift_rejects_partial_overlap_without_mutating() {
        let mut ranges = vec![TextRange::new(0, 3), TextRange::new(4, 7)];
        let err = shift(&mut ranges, &TextEdit::new(5, 9, 1)).unwrap_err();
        assert!(matches!(err, Error::RangeOverlapInconsistent { .. }));
        assert_eq!(ranges, vec![TextRange::new(0, 3), TextRange::new(4, 7)]);
    }

    #[rstest]
    #[case::before(TextRange::new(0, 5), 5, Placement::Before)]
    #[case::starts_at_point(TextRange::new(5, 8), 5, Placement::After)]
    #[case::zero_width_at_point(TextRange::new(5, 5), 5, Placement::After)]
    #[case::strictly_around(TextRange::new(2, 8), 5, Placement::Contains)]
    fn test_classify_insertion_boundaries(
        #[case] range: TextRange,
        #[case] at: usize,
        #[case] expected: Placement,
    ) {
        assert_eq!(classify(range, &TextEdit::insert(at, 3)), expected);
    }

    #[test]
    fn test_grow_requires_containment() {
        let edit = TextEdit::insert(10, 4);
        assert_eq!(
            grow(TextRange::new(0, 10), &edit).unwrap(),
            TextRange::new(0, 14)
        );
        assert!(grow(TextRange::new(11, 20), &edit).is_err());
    }

    #[test]
    fn test_shift_through_descending_edits() {
        // two renames in "x + x": [4,5) then [0,1), both to "yy"
        let edits = [TextEdit::new(4, 5, 2), TextEdit::new(0, 1, 2)];
        assert_eq!(
            shift_through(TextRange::new(2, 3), &edits).unwrap(),
            TextRange::new(3, 4)
        );
        assert_eq!(
            shift_through(TextRange::new(0, 5), &edits).unwrap(),
            TextRange::new(0, 7)
        );
    }

    #[test]
    fn test_apply_replacements_right_to_left() {
        let mut text = "let x = x;".to_string();
        let mut replacements = vec![Replacement::new(4, 5, "value"), Replacement::new(8, 9, "value")];
        sort_replacements(&mut replacements).unwrap();
        apply_replacements(&mut text, &replacements).unwrap();
        assert_eq!(text, "let value = value;");
    }

    #[test]
    fn test_sort_replacements_rejects_overlap() {
        let mut replacements = vec![Replacement::new(0, 5, "a"), Replacement::new(3, 8, "b")];
        assert!(sort_replacements(&mut replacements).is_err());
    }

    #[test]
    fn test_apply_replacements_checks_char_boundaries() {
        let mut text = "héllo".to_string();
        let err = apply_replacements(&mut text, &[Replacement::new(2, 3, "e")]).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
        assert_eq!(text, "héllo");
    }
}
