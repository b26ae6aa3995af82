//! Engine unit tests: arena lifecycle, link construction, scan order, and
//! the two replacement modes.

use std::ops::ControlFlow;

use crate::api::Error;
use crate::engine::{Automaton, NO_NODE, ROOT};

fn compiled(patterns: &[(&'static [u8], &'static [u8])]) -> Automaton<'static> {
    let mut ac = Automaton::new(0);
    for &(p, r) in patterns {
        ac.register(p, r).unwrap();
    }
    ac.compile().unwrap();
    ac
}

fn scan_spans(ac: &Automaton<'static>, text: &[u8]) -> Vec<(usize, usize, Vec<u8>)> {
    let mut spans = Vec::new();
    let count = ac
        .scan(text, |m| {
            spans.push((m.start, m.end, m.pattern.to_vec()));
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(count, spans.len());
    spans
}

#[test]
fn register_rejects_empty_pattern() {
    let mut ac: Automaton = Automaton::new(0);
    assert_eq!(ac.register(b"", b"x"), Err(Error::EmptyPattern));
}

#[test]
fn register_full_arena() {
    // Capacity 3: root + 2 nodes. "ab" fits exactly; any further new edge
    // must fail without clobbering what is already registered.
    let mut ac: Automaton = Automaton::new(3);
    ac.register(b"ab", b"x").unwrap();
    assert_eq!(
        ac.register(b"cd", b"y"),
        Err(Error::ArenaFull { capacity: 3 })
    );

    // The successfully registered pattern still works after compile.
    ac.compile().unwrap();
    let out = ac.replace_alloc(b"ab").unwrap();
    assert_eq!(out.bytes, b"x");
}

#[test]
fn register_shared_prefix_reuses_nodes() {
    let mut ac: Automaton = Automaton::new(0);
    ac.register(b"abc", b"1").unwrap();
    let nodes_before = ac.stats().nodes;
    ac.register(b"abd", b"2").unwrap();
    // Only the final byte diverges.
    assert_eq!(ac.stats().nodes, nodes_before + 1);
}

#[test]
fn register_overwrites_binding_last_writer_wins() {
    let mut ac: Automaton = Automaton::new(0);
    ac.register(b"key", b"old").unwrap();
    ac.register(b"key", b"new").unwrap();
    assert_eq!(ac.stats().patterns, 1);
    ac.compile().unwrap();
    assert_eq!(ac.replace_alloc(b"key").unwrap().bytes, b"new");
}

#[test]
fn compile_twice_is_an_error() {
    let mut ac: Automaton = Automaton::new(0);
    ac.register(b"a", b"b").unwrap();
    ac.compile().unwrap();
    assert_eq!(ac.compile(), Err(Error::AlreadyCompiled));
    // The failed second compile leaves the automaton usable.
    assert!(ac.is_compiled());
    assert_eq!(ac.replace_alloc(b"a").unwrap().bytes, b"b");
}

#[test]
fn register_invalidates_compilation() {
    let mut ac: Automaton = Automaton::new(0);
    ac.register(b"a", b"1").unwrap();
    ac.compile().unwrap();
    assert!(ac.is_compiled());

    ac.register(b"b", b"2").unwrap();
    assert!(!ac.is_compiled());
    assert_eq!(ac.scan(b"ab", |_| ControlFlow::Continue(())), Err(Error::NotCompiled));

    // Amend-and-recompile picks up both patterns.
    ac.compile().unwrap();
    assert_eq!(ac.replace_alloc(b"ab").unwrap().bytes, b"12");
}

#[test]
fn scan_before_compile_is_an_error() {
    let mut ac: Automaton = Automaton::new(0);
    ac.register(b"a", b"b").unwrap();
    assert_eq!(ac.scan(b"a", |_| ControlFlow::Continue(())), Err(Error::NotCompiled));
    assert_eq!(ac.replace_alloc(b"a"), Err(Error::NotCompiled));
    let mut buf = *b"a";
    assert_eq!(ac.replace_inplace(&mut buf, 1), Err(Error::NotCompiled));
}

#[test]
fn failure_links_point_strictly_shallower() {
    let ac = compiled(&[(b"he", b""), (b"she", b""), (b"his", b""), (b"hers", b"")]);

    // Depth per node by BFS from the root over child edges.
    let mut depth = vec![usize::MAX; ac.stats().nodes];
    depth[ROOT as usize] = 0;
    let mut queue = std::collections::VecDeque::from([ROOT]);
    while let Some(u) = queue.pop_front() {
        for b in 0..256 {
            let v = ac.nodes[u as usize].children[b];
            if v != NO_NODE {
                depth[v as usize] = depth[u as usize] + 1;
                queue.push_back(v);
            }
        }
    }

    for (id, node) in ac.nodes.iter().enumerate() {
        if id == ROOT as usize {
            continue;
        }
        assert_ne!(node.failure, NO_NODE, "node {id} missing failure link");
        assert!(
            depth[node.failure as usize] < depth[id],
            "failure of node {id} is not shallower"
        );
        if node.output != NO_NODE {
            assert!(ac.nodes[node.output as usize].terminal);
        }
    }
}

#[test]
fn scan_reports_overlapping_occurrences() {
    // Classic Aho-Corasick corpus: "ushers" contains she, he, hers.
    let ac = compiled(&[(b"he", b""), (b"she", b""), (b"his", b""), (b"hers", b"")]);
    let spans = scan_spans(&ac, b"ushers");
    assert_eq!(
        spans,
        vec![
            (1, 3, b"she".to_vec()),
            (2, 3, b"he".to_vec()),
            (2, 5, b"hers".to_vec()),
        ]
    );
}

#[test]
fn scan_emits_deepest_first_at_shared_end() {
    // "bcd" and "abcd" both end at index 3 of "abcd"; the output chain
    // yields the deeper terminal first.
    let ac = compiled(&[(b"bcd", b""), (b"abcd", b"")]);
    let spans = scan_spans(&ac, b"abcd");
    assert_eq!(
        spans,
        vec![(0, 3, b"abcd".to_vec()), (1, 3, b"bcd".to_vec())]
    );
}

#[test]
fn scan_stop_is_counted() {
    let ac = compiled(&[(b"a", b"")]);
    let mut seen = 0usize;
    let count = ac
        .scan(b"aaaa", |_| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(seen, 2);
}

#[test]
fn scan_match_at_both_boundaries() {
    let ac = compiled(&[(b"ab", b"")]);
    let spans = scan_spans(&ac, b"abxxab");
    assert_eq!(spans, vec![(0, 1, b"ab".to_vec()), (4, 5, b"ab".to_vec())]);
}

#[test]
fn scan_single_byte_input() {
    let ac = compiled(&[(b"a", b"")]);
    assert_eq!(scan_spans(&ac, b"a"), vec![(0, 0, b"a".to_vec())]);
    assert!(scan_spans(&ac, b"b").is_empty());
    assert!(scan_spans(&ac, b"").is_empty());
}

#[test]
fn scan_non_ascii_bytes() {
    // Byte-exact over the full alphabet, no UTF-8 assumptions.
    let pattern: &[u8] = &[0x00, 0xff, 0x80];
    let mut ac: Automaton = Automaton::new(0);
    ac.register(pattern, b"!").unwrap();
    ac.compile().unwrap();
    let text: Vec<u8> = [0xfeu8, 0x00, 0xff, 0x80, 0x00].to_vec();
    let out = ac.replace_alloc(&text).unwrap();
    assert_eq!(out.bytes, [0xfeu8, b'!', 0x00]);
    assert_eq!(out.replaced, 1);
}

#[test]
fn scan_dense_root_takes_plain_path() {
    // More than three distinct first bytes disables the memchr skip; the
    // result must be identical.
    let ac = compiled(&[(b"aa", b""), (b"bb", b""), (b"cc", b""), (b"dd", b"")]);
    let spans = scan_spans(&ac, b"xxaaxbbxccxdd");
    assert_eq!(spans.len(), 4);
}

#[test]
fn replace_alloc_no_match_copies_input() {
    let ac = compiled(&[(b"xyz", b"abc")]);
    let out = ac.replace_alloc(b"hello world").unwrap();
    assert_eq!(out.bytes, b"hello world");
    assert_eq!(out.replaced, 0);
}

#[test]
fn replace_alloc_empty_input() {
    let ac = compiled(&[(b"a", b"b")]);
    let out = ac.replace_alloc(b"").unwrap();
    assert!(out.bytes.is_empty());
    assert_eq!(out.replaced, 0);
}

#[test]
fn replace_alloc_deletion_binding() {
    // A pattern registered with neither replacement nor user data deletes.
    let mut ac: Automaton = Automaton::new(0);
    ac.register_with_data(b"gone", None, None).unwrap();
    ac.compile().unwrap();
    let out = ac.replace_alloc(b"a gone b").unwrap();
    assert_eq!(out.bytes, b"a  b");
    assert_eq!(out.replaced, 1);
}

#[test]
fn replace_with_evaluates_only_kept_matches_once() {
    // "abc" and "bcd" overlap in "abcd"; only the kept leftmost match may
    // reach the callback, exactly once.
    let ac = compiled(&[(b"abc", b""), (b"bcd", b"")]);
    let mut seen: Vec<Vec<u8>> = Vec::new();
    let out = ac
        .replace_with(b"abcd", |m| {
            seen.push(m.pattern.to_vec());
            b"123".to_vec()
        })
        .unwrap();
    assert_eq!(out.bytes, b"123d");
    assert_eq!(out.replaced, 1);
    assert_eq!(seen, vec![b"abc".to_vec()]);
}

#[test]
fn replace_with_empty_return_deletes() {
    let ac = compiled(&[(b"drop", b"unused")]);
    let out = ac.replace_with(b"a drop b", |_| Vec::new()).unwrap();
    assert_eq!(out.bytes, b"a  b");
    assert_eq!(out.replaced, 1);
}

#[test]
fn replace_with_growing_replacement() {
    let ac = compiled(&[(b"x", b"")]);
    let out = ac
        .replace_with(b"x.x", |m| {
            let mut v = m.pattern.to_vec();
            v.extend_from_slice(b"!!!!");
            v
        })
        .unwrap();
    assert_eq!(out.bytes, b"x!!!!.x!!!!");
    assert_eq!(out.replaced, 2);
}

#[test]
fn replace_inplace_shrinking() {
    let ac = compiled(&[(b"hello", b"hi"), (b"world", b"universe")]);
    let mut buf = [0u8; 64];
    buf[..11].copy_from_slice(b"hello world");
    let out = ac.replace_inplace(&mut buf, 11).unwrap();
    assert_eq!(out.replaced, 2);
    assert_eq!(&buf[..out.new_len], b"hi universe");
}

#[test]
fn replace_inplace_skips_over_capacity() {
    // "aa" -> 6 bytes lands exactly on the 8-byte capacity; the same
    // substitution in a 4-byte buffer must be skipped untouched.
    let ac = compiled(&[(b"aa", b"AAAAAA")]);
    let mut buf = [0u8; 8];
    buf[..4].copy_from_slice(b"aaxx");
    let out = ac.replace_inplace(&mut buf, 4).unwrap();
    assert_eq!(out.replaced, 1);
    assert_eq!(&buf[..out.new_len], b"AAAAAAxx");

    // No room at all: the buffer is left as-is.
    let mut tight = *b"aaxx";
    let out = ac.replace_inplace(&mut tight, 4).unwrap();
    assert_eq!(out.replaced, 0);
    assert_eq!(&tight, b"aaxx");
}

#[test]
fn replace_inplace_agrees_with_alloc_on_overlap() {
    // Both modes select the same leftmost-wins schedule.
    let ac = compiled(&[(b"abc", b"123"), (b"bcd", b"456")]);
    let alloc = ac.replace_alloc(b"abcd").unwrap();

    let mut buf = [0u8; 32];
    buf[..4].copy_from_slice(b"abcd");
    let inplace = ac.replace_inplace(&mut buf, 4).unwrap();

    assert_eq!(&buf[..inplace.new_len], alloc.bytes.as_slice());
    assert_eq!(inplace.replaced, alloc.replaced);
    assert_eq!(alloc.bytes, b"123d");
}

#[test]
fn replace_inplace_zero_capacity_headroom() {
    // Same-length replacement needs no headroom.
    let ac = compiled(&[(b"cat", b"dog")]);
    let mut buf = *b"a cat sat";
    let out = ac.replace_inplace(&mut buf, 9).unwrap();
    assert_eq!(&buf[..out.new_len], b"a dog sat");
    assert_eq!(out.new_len, 9);
}

#[test]
fn reset_clears_patterns_and_keeps_capacity() {
    let mut ac: Automaton = Automaton::new(128);
    ac.register(b"abc", b"x").unwrap();
    ac.compile().unwrap();
    assert!(ac.stats().nodes > 1);

    ac.reset();
    assert!(!ac.is_compiled());
    assert_eq!(ac.stats().nodes, 1);
    assert_eq!(ac.stats().patterns, 0);
    assert_eq!(ac.capacity(), 128);

    // The automaton is reusable after reset.
    ac.register(b"q", b"r").unwrap();
    ac.compile().unwrap();
    assert_eq!(ac.replace_alloc(b"q").unwrap().bytes, b"r");
}

#[test]
fn stats_counts_terminals_not_registrations() {
    let mut ac: Automaton = Automaton::new(0);
    ac.register(b"aa", b"1").unwrap();
    ac.register(b"aa", b"2").unwrap();
    ac.register(b"ab", b"3").unwrap();
    let stats = ac.stats();
    assert_eq!(stats.patterns, 2);
    // Root + 'a' + 'a'/'b' leaves.
    assert_eq!(stats.nodes, 4);
    assert!(stats.bytes > 0);
}

#[test]
fn stats_unchanged_across_invocations() {
    let ac = compiled(&[(b"needle", b"pin")]);
    let before = ac.stats();
    for _ in 0..10 {
        ac.replace_alloc(b"a needle in a haystack of needles").unwrap();
        let _ = ac.replace_with(b"needle", |_| b"dyn".to_vec()).unwrap();
    }
    assert_eq!(ac.stats(), before);
}

#[test]
fn compile_with_no_patterns() {
    let mut ac: Automaton = Automaton::new(0);
    ac.compile().unwrap();
    let out = ac.replace_alloc(b"anything").unwrap();
    assert_eq!(out.bytes, b"anything");
    assert_eq!(out.replaced, 0);
}

#[test]
fn user_data_reaches_callback() {
    let mut ac: Automaton<'_, u32> = Automaton::new(0);
    ac.register_with_data(b"tag", None, Some(7)).unwrap();
    ac.compile().unwrap();
    let out = ac
        .replace_with(b"<tag>", |m| {
            assert_eq!(m.user_data, Some(&7));
            format!("{}", m.user_data.unwrap()).into_bytes()
        })
        .unwrap();
    assert_eq!(out.bytes, b"<7>");
}

#[cfg(feature = "stats")]
#[test]
fn counters_accumulate() {
    let ac = compiled(&[(b"a", b"bb")]);
    ac.replace_alloc(b"a.a").unwrap();
    let snap = ac.counters();
    assert_eq!(snap.scans, 1);
    assert_eq!(snap.matches, 2);
    assert_eq!(snap.replacements, 2);
    assert_eq!(snap.bytes_in, 3);
    assert_eq!(snap.bytes_out, 5);
}
