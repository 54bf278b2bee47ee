//! Conflict detection and splicing in `patch::apply`.

use echocore::patch::{apply, line_diff, PatchError, PatchOp, PatchRule};

fn op(start: usize, end: usize, replacement: &str) -> PatchOp {
    PatchOp {
        start,
        end,
        replacement: replacement.to_owned(),
        rule: PatchRule::DivisionByZero,
    }
}

#[test]
fn nested_ranges_conflict() {
    let source = "x = a / 0;";
    let err = apply(source, &[op(0, 10, "x = null;"), op(4, 9, "b")]).expect_err("conflict");
    assert!(matches!(err, PatchError::Conflict { .. }));
    assert!(err.to_string().starts_with("patch conflict"));
}

#[test]
fn out_of_range_op_is_rejected() {
    let err = apply("abc", &[op(2, 9, "z")]).expect_err("out of bounds");
    assert!(matches!(
        err,
        PatchError::OutOfBounds {
            start: 2,
            end: 9,
            len: 3
        }
    ));
}

#[test]
fn inverted_range_is_rejected() {
    assert!(matches!(
        apply("abc", &[op(2, 1, "z")]),
        Err(PatchError::OutOfBounds { .. })
    ));
}

#[test]
fn insertion_and_deletion_compose() {
    let source = "one two three";
    let patched = apply(source, &[op(3, 3, ",")]).expect("apply");
    assert_eq!(patched, "one, two three");
    let patched = apply(source, &[op(3, 7, ""), op(0, 0, ">")]).expect("apply");
    assert_eq!(patched, ">one three");
}

#[test]
fn diff_of_grown_text_compares_against_empty_lines() {
    assert_eq!(line_diff("a\n", "a\nb\n"), "-\n+b\n");
    assert_eq!(line_diff("a\nb\n", "a\n"), "-b\n+\n");
}
