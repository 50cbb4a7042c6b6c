//! Position arithmetic over explicit node lists

use nodekeep::text::{Replacement, apply_replacements, shift, shift_through, sort_replacements};
use nodekeep::{Error, TextEdit, TextRange};
use rstest::rstest;

#[test]
fn test_replacing_middle_word_shifts_neighbours() {
    let mut text = String::from("aaa bbb ccc");
    let mut ranges = [
        TextRange::new(0, 3),
        TextRange::new(4, 7),
        TextRange::new(8, 11),
    ];
    let replacement = Replacement::new(4, 7, "longer");

    shift(&mut ranges, &replacement.edit()).unwrap();
    apply_replacements(&mut text, &[replacement]).unwrap();

    assert_eq!(
        ranges,
        [
            TextRange::new(0, 3),
            TextRange::new(4, 10),
            TextRange::new(11, 14),
        ]
    );
    assert_eq!(text, "aaa longer ccc");
    assert_eq!(&text[4..10], "longer");
    assert_eq!(&text[11..14], "ccc");
}

#[rstest]
#[case::straddles_start(TextRange::new(2, 5))]
#[case::straddles_end(TextRange::new(6, 9))]
fn test_partial_overlap_is_fatal_and_leaves_ranges_untouched(#[case] bad: TextRange) {
    let mut ranges = [TextRange::new(0, 3), bad];
    let err = shift(&mut ranges, &TextEdit::new(4, 7, 6)).unwrap_err();

    assert!(matches!(err, Error::RangeOverlapInconsistent { .. }));
    assert_eq!(ranges, [TextRange::new(0, 3), bad]);
}

#[test]
fn test_multiple_replacements_fold_right_to_left() {
    let mut replacements = vec![
        Replacement::new(0, 1, "xyz"),
        Replacement::new(4, 5, "xyz"),
    ];
    sort_replacements(&mut replacements).unwrap();
    let edits: Vec<TextEdit> = replacements.iter().map(Replacement::edit).collect();

    // `b` sits between the two edits
    let b = shift_through(TextRange::new(2, 3), &edits).unwrap();
    assert_eq!(b, TextRange::new(4, 5));

    let mut text = String::from("a b c");
    apply_replacements(&mut text, &replacements).unwrap();
    assert_eq!(text, "xyz b xyz");
}
