use proptest::prelude::*;

use opvisor::multiplex::LineSplitter;

/// Lines that survive splitting unchanged: no terminators, not empty, and
/// not starting with whitespace (so the trailing fragment trims cleanly).
fn line() -> impl Strategy<Value = String> {
    "[a-zé✓!][a-z é✓!]{0,12}[a-zé✓!]?"
}

/// Feed `bytes` to a splitter cut at the given points.
fn split_at(bytes: &[u8], cuts: &[usize]) -> Vec<String> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.sort_unstable();

    let mut splitter = LineSplitter::new();
    let mut out = Vec::new();
    let mut start = 0;
    for point in points {
        out.extend(splitter.push(&bytes[start..point]));
        start = point;
    }
    out.extend(splitter.push(&bytes[start..]));
    out.extend(splitter.finish());
    out
}

proptest! {
    #[test]
    fn chunk_boundaries_do_not_change_the_lines(
        lines in proptest::collection::vec(line(), 0..20),
        cuts in proptest::collection::vec(any::<usize>(), 0..10),
        crlf in any::<bool>(),
        terminated in any::<bool>(),
    ) {
        let sep = if crlf { "\r\n" } else { "\n" };
        let mut text = lines.join(sep);
        if terminated && !lines.is_empty() {
            text.push_str(sep);
        }

        let mut expected = lines.clone();
        if !terminated {
            if let Some(last) = expected.last_mut() {
                *last = last.trim().to_string();
            }
        }

        prop_assert_eq!(split_at(text.as_bytes(), &cuts), expected);
    }

    #[test]
    fn empty_lines_never_come_out(
        pieces in proptest::collection::vec(prop_oneof![Just("\n"), Just("\r\n"), Just("x")], 0..40),
        cuts in proptest::collection::vec(any::<usize>(), 0..5),
    ) {
        let text: String = pieces.concat();
        for line in split_at(text.as_bytes(), &cuts) {
            prop_assert!(!line.is_empty());
            prop_assert!(!line.contains('\n'));
        }
    }
}
