use codevec_core::chunker::{split, Chunker};
use codevec_core::ChunkingError;

/// Drop the overlap prefix of every piece after the first and concatenate.
fn rejoin(pieces: &[String], overlap: usize) -> String {
    let mut out = String::new();
    for (i, p) in pieces.iter().enumerate() {
        if i == 0 { out.push_str(p); } else { out.extend(p.chars().skip(overlap)); }
    }
    out
}

fn char_len(s: &str) -> usize { s.chars().count() }

fn assert_properties(text: &str, max_size: usize, overlap: usize) {
    let pieces = split(text, max_size, overlap).expect("valid params");
    assert!(!pieces.is_empty());
    for p in &pieces { assert!(char_len(p) <= max_size, "piece longer than {max_size}: {p:?}"); }
    for pair in pieces.windows(2) {
        let tail: String = pair[0].chars().skip(char_len(&pair[0]) - overlap).collect();
        let head: String = pair[1].chars().take(overlap).collect();
        assert_eq!(tail, head, "consecutive pieces share exactly {overlap} chars");
    }
    assert_eq!(rejoin(&pieces, overlap), text);
}

fn sample_source() -> String {
    let mut s = String::new();
    for i in 0..60 {
        s.push_str(&format!("export function handler{i}(task: Task): string {{\n  return task.title + \" #{i}\";\n}}\n\n"));
    }
    s
}

#[test]
fn empty_input_yields_no_chunks() {
    assert!(split("", 1000, 200).unwrap().is_empty());
}

#[test]
fn short_input_is_one_chunk() {
    let text = "export const x = 1;";
    assert_eq!(split(text, 1000, 200).unwrap(), vec![text.to_string()]);
}

#[test]
fn exact_size_input_is_one_chunk() {
    let text = "a".repeat(50);
    assert_eq!(split(&text, 50, 10).unwrap().len(), 1);
}

#[test]
fn default_parameters_hold_properties_on_code() {
    let text = sample_source();
    assert!(text.len() > 3000);
    assert_properties(&text, 1000, 200);
    let c = Chunker::default();
    assert_eq!((c.max_size(), c.overlap()), (1000, 200));
}

#[test]
fn properties_hold_across_parameter_grid() {
    let code = sample_source();
    let prose = "lorem ipsum dolor sit amet ".repeat(40);
    let dense = "x".repeat(333);
    for text in [code.as_str(), prose.as_str(), dense.as_str()] {
        for (max_size, overlap) in [(1, 0), (7, 3), (64, 0), (64, 63), (120, 30), (500, 100)] {
            assert_properties(text, max_size, overlap);
        }
    }
}

#[test]
fn multibyte_text_is_split_on_char_boundaries() {
    let text = "задача — категория 📋 ".repeat(30);
    assert_properties(&text, 40, 8);
}

#[test]
fn breaks_at_line_boundaries_when_available() {
    let text = sample_source();
    let pieces = split(&text, 1000, 200).unwrap();
    for p in &pieces[..pieces.len() - 1] {
        assert!(p.ends_with('\n'), "expected a line boundary cut: {:?}", &p[p.len().saturating_sub(20)..]);
    }
}

#[test]
fn deterministic_for_same_input() {
    let text = sample_source();
    assert_eq!(split(&text, 300, 50).unwrap(), split(&text, 300, 50).unwrap());
}

#[test]
fn invalid_parameters_are_rejected() {
    assert_eq!(split("abc", 0, 0), Err(ChunkingError::ZeroMaxSize));
    assert_eq!(split("abc", 10, 10), Err(ChunkingError::OverlapTooLarge { max_size: 10, overlap: 10 }));
    assert!(split("abc", 10, 11).is_err());
}
