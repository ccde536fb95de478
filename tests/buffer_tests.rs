use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use deferred_log::loggable::render_display;
use deferred_log::{record, ArgBuffer, ByteRelocatable, Level, Loggable, Relocatable};

/// Relocation/teardown instrumentation injected into test values. Counters
/// live in the fixture, not in globals, so tests stay independent.
#[derive(Default)]
struct Counters {
    moves: AtomicUsize,
    copies: AtomicUsize,
    destroys: AtomicUsize,
}

impl Counters {
    fn moves(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }
    fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
    fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

/// A move-relocatable value: growth relocates it with a single move
/// construction and no copies.
struct Tracked {
    value: u32,
    counters: Arc<Counters>,
}

impl fmt::Display for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T({})", self.value)
    }
}

impl Relocatable for Tracked {
    unsafe fn relocate(src: *mut Self, dst: *mut Self) {
        let value = src.read();
        value.counters.moves.fetch_add(1, Ordering::SeqCst);
        dst.write(value);
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counters.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

impl Loggable for Tracked {
    fn append_to(self, buf: &mut ArgBuffer) {
        buf.push_owned(self, render_display::<Tracked>);
    }
}

/// A copy-only value: growth relocates it by cloning into the new slot and
/// dropping the stale copy, never by moving.
struct CopyOnly {
    value: u32,
    counters: Arc<Counters>,
}

impl fmt::Display for CopyOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C({})", self.value)
    }
}

impl Relocatable for CopyOnly {
    unsafe fn relocate(src: *mut Self, dst: *mut Self) {
        let old = &*src;
        old.counters.copies.fetch_add(1, Ordering::SeqCst);
        dst.write(CopyOnly {
            value: old.value,
            counters: old.counters.clone(),
        });
        std::ptr::drop_in_place(src);
    }
}

impl Drop for CopyOnly {
    fn drop(&mut self) {
        self.counters.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

impl Loggable for CopyOnly {
    fn append_to(self, buf: &mut ArgBuffer) {
        buf.push_owned(self, render_display::<CopyOnly>);
    }
}

/// Big inline payload used to force a buffer growth with a single append.
#[derive(Clone, Copy)]
struct Blob([u8; 1024]);

impl Blob {
    fn new() -> Self {
        Blob([0xAB; 1024])
    }
}

unsafe impl ByteRelocatable for Blob {}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob[{}]", self.0.len())
    }
}

impl Loggable for Blob {
    fn append_to(self, buf: &mut ArgBuffer) {
        buf.push_trivial(self, render_display::<Blob>);
    }
}

#[test]
fn growth_relocates_move_value_with_exactly_one_move() {
    let counters = Arc::new(Counters::default());
    let mut rec = record!(Level::Info, "{} {}");
    rec.arg(Tracked {
        value: 7,
        counters: counters.clone(),
    });
    assert_eq!(counters.moves(), 0);

    // One oversized append, one growth, one relocation of the first entry.
    rec.arg(Blob::new());

    assert_eq!(counters.moves(), 1, "move-relocatable value must move exactly once");
    assert_eq!(counters.copies(), 0, "no copy construction may occur for a move type");
    assert_eq!(counters.destroys(), 0, "a move vacates the old slot without destroying");
    assert_eq!(rec.render(), "T(7) blob[1024]");

    drop(rec);
    assert_eq!(counters.destroys(), 1, "teardown destroys the final copy once");
}

#[test]
fn growth_relocates_copy_only_value_with_exactly_one_copy() {
    let counters = Arc::new(Counters::default());
    let mut rec = record!(Level::Info, "{} {}");
    rec.arg(CopyOnly {
        value: 9,
        counters: counters.clone(),
    });

    rec.arg(Blob::new());

    assert_eq!(counters.copies(), 1, "copy-only value must copy exactly once");
    assert_eq!(counters.moves(), 0, "a copy-only type never moves");
    assert_eq!(counters.destroys(), 1, "the stale pre-growth copy is dropped once");
    assert_eq!(rec.render(), "C(9) blob[1024]");

    drop(rec);
    assert_eq!(counters.destroys(), 2, "final copy destroyed once at teardown");
}

#[test]
fn destroy_count_matches_appended_values_across_growths() {
    let counters = Arc::new(Counters::default());
    const N: u32 = 8;

    let mut rec = record!(Level::Debug, "ignored");
    for i in 0..N {
        rec.arg(Tracked {
            value: i,
            counters: counters.clone(),
        });
        // Interleave oversized payloads so several growths happen.
        rec.arg(Blob::new());
    }

    assert!(counters.moves() > 0, "growth should have relocated something");
    assert_eq!(counters.destroys(), 0);

    drop(rec);
    assert_eq!(
        counters.destroys(),
        N as usize,
        "each logical value is destroyed exactly once over the record's life"
    );
}

#[derive(Clone, Copy)]
#[repr(align(64))]
struct Aligned64(u64);

unsafe impl ByteRelocatable for Aligned64 {}

impl fmt::Display for Aligned64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Loggable for Aligned64 {
    fn append_to(self, buf: &mut ArgBuffer) {
        buf.push_trivial(self, render_display::<Aligned64>);
    }
}

#[test]
fn decode_time_addresses_satisfy_payload_alignment() {
    let mut rec = record!(Level::Info, "ignored");
    rec.arg(1u8);
    // Over-aligned payload forces a reallocation at stronger alignment.
    rec.arg(Aligned64(5));
    rec.arg(2u8);

    let check = |rec: &deferred_log::Record| {
        let args: Vec<_> = rec.args().collect();
        assert_eq!(args[1].as_ptr() as usize % 64, 0, "align(64) payload misplaced");
        assert_eq!(args[0].to_string(), "1");
        assert_eq!(args[1].to_string(), "5");
        assert_eq!(args[2].to_string(), "2");
    };
    check(&rec);

    // Grow again after the realignment; placement must still hold.
    rec.arg(Blob::new());
    check(&rec);
}

#[test]
fn growth_preserves_entry_order_and_count() {
    let mut rec = record!(Level::Trace, "ignored");
    let mut expected = Vec::new();
    for i in 0..50u32 {
        rec.arg(i);
        expected.push(i.to_string());
        if i % 10 == 0 {
            rec.arg(Blob::new());
            expected.push("blob[1024]".to_string());
        }
        rec.arg(format!("s{}", i));
        expected.push(format!("s{}", i));
    }

    assert_eq!(rec.arg_count(), expected.len());
    let rendered: Vec<String> = rec.args().map(|a| a.to_string()).collect();
    assert_eq!(rendered, expected);
}
