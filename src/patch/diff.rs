//! Line-aligned diff rendering.

/// Render a positional diff of `original` against `patched`.
///
/// Lines are compared index by index over the longer of the two texts; a
/// missing tail line compares as the empty string. Every differing index
/// emits one `-old` line followed by one `+new` line. Insertions are not
/// realigned, so one inserted line shows every later line as changed.
pub fn line_diff(original: &str, patched: &str) -> String {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = patched.lines().collect();
    let rows = old.len().max(new.len());

    let mut out = String::new();
    for i in 0..rows {
        let o = old.get(i).copied().unwrap_or_default();
        let p = new.get(i).copied().unwrap_or_default();
        if o != p {
            out.push('-');
            out.push_str(o);
            out.push('\n');
            out.push('+');
            out.push_str(p);
            out.push('\n');
        }
    }
    out
}
