use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use crate::loggable::{ByteRelocatable, Relocatable};

/// Core argument-encoding buffer for deferred log formatting.
///
/// This module provides the ArgBuffer struct: an owned, contiguous, growable
/// byte region that stores a heterogeneous sequence of argument values
/// together with just enough type-erased metadata to relocate them when the
/// buffer grows, destroy them when the record dies, and reconstruct a
/// render-ready handle for each of them at formatting time.

/// Reconstructs a render-ready value from its raw payload address and writes
/// it through the formatter.
///
/// # Safety
///
/// The pointer must address a live, initialized payload of the type the
/// function was instantiated for.
pub type RenderFn = unsafe fn(*const u8, &mut fmt::Formatter<'_>) -> fmt::Result;

/// Relocates a payload from `src` to `dst` during buffer growth.
///
/// # Safety
///
/// `src` must hold a live payload of the right type and `dst` must point at
/// uninitialized storage of the same size and alignment. After the call the
/// value at `src` is dead: the buffer will never touch it again, in
/// particular it will not invoke the destroy function on it.
pub type RelocateFn = unsafe fn(src: *mut u8, dst: *mut u8);

/// Destroys a payload in place at record teardown.
///
/// # Safety
///
/// The pointer must address a live payload of the right type. Invoked exactly
/// once per logical value over the record's lifetime.
pub type DestroyFn = unsafe fn(*mut u8);

/// Per-entry relocation/teardown behavior.
///
/// Byte-relocatable entries move by plain byte copy and need no teardown.
/// Owned entries carry the two function pointers that complete the
/// relocate/destroy/render contract for their concrete type.
#[derive(Clone, Copy)]
enum EntryOps {
    Trivial,
    Owned {
        relocate: RelocateFn,
        destroy: DestroyFn,
    },
}

/// Header written immediately before each payload.
///
/// The header itself is trivially copyable, so growth always moves headers
/// with a plain byte copy regardless of what kind of payload follows them.
#[repr(C)]
#[derive(Clone, Copy)]
struct EntryHeader {
    size: usize,
    align: usize,
    render: RenderFn,
    ops: EntryOps,
}

const HEADER_SIZE: usize = mem::size_of::<EntryHeader>();
const HEADER_ALIGN: usize = mem::align_of::<EntryHeader>();

/// Smallest allocation made when the first entry arrives.
const MIN_CAP: usize = 64;

/// Rounds `offset` up to the next multiple of `align` (a power of two).
///
/// Write path and decode path both use this on integer offsets, so entry
/// addresses stay consistent across reallocations as long as the allocation
/// base is at least as aligned as every payload.
#[inline]
fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// An owned, growable byte store for the arguments of one log record.
///
/// Values are appended through one of two paths:
///
/// * [`push_trivial`](ArgBuffer::push_trivial) for byte-relocatable values,
///   whose bytes can be copied verbatim to a new location;
/// * [`push_owned`](ArgBuffer::push_owned) for values that need an explicit
///   relocation step when the buffer grows and an explicit destroy step when
///   the record is torn down.
///
/// Each entry is written as a header (size, alignment, render function, and
/// for owned entries the relocate/destroy functions) followed by the payload
/// bytes at the first suitably aligned offset. Growth reallocates and replays
/// every existing entry in order at the same offsets, never changing entry
/// order or count.
///
/// ArgBuffer is not thread-safe: it is mutated by the single thread building
/// the record. It is `Send`, so a finished record can be handed off whole to
/// another thread for rendering.
///
/// # Examples
///
/// ```
/// use deferred_log::ArgBuffer;
/// use deferred_log::loggable::render_display;
///
/// let mut buf = ArgBuffer::new();
/// buf.push_trivial(42i32, render_display::<i32>);
/// buf.push_owned(String::from("answer"), render_display::<String>);
///
/// let rendered: Vec<String> = buf.iter().map(|arg| arg.to_string()).collect();
/// assert_eq!(rendered, ["42", "answer"]);
/// ```
pub struct ArgBuffer {
    ptr: *mut u8,
    cap: usize,
    /// Alignment of the current allocation. Always at least HEADER_ALIGN and
    /// at least the alignment of every payload written so far.
    align: usize,
    /// Offset of the next free byte.
    cursor: usize,
    /// Number of fully written entries.
    len: usize,
}

// Safety: every append path bounds its payload type by `Send + 'static`, and
// the buffer is exclusively owned, so moving it to another thread moves every
// payload with it.
unsafe impl Send for ArgBuffer {}

impl ArgBuffer {
    /// Creates an empty buffer. No allocation happens until the first append.
    pub const fn new() -> Self {
        Self {
            ptr: ptr::null_mut(),
            cap: 0,
            align: HEADER_ALIGN,
            cursor: 0,
            len: 0,
        }
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a byte-relocatable value.
    ///
    /// The header is tagged trivial: any future relocation of this entry is a
    /// plain byte copy and teardown takes no action. `render` reconstructs
    /// the render-ready handle from the payload address at formatting time;
    /// for `Display` types use
    /// [`render_display`](crate::loggable::render_display).
    pub fn push_trivial<T>(&mut self, value: T, render: RenderFn)
    where
        T: ByteRelocatable + Send + 'static,
    {
        let slot = self.reserve(Layout::new::<T>(), render, EntryOps::Trivial);
        unsafe {
            (slot as *mut T).write(value);
        }
    }

    /// Appends a value that needs explicit relocation and teardown.
    ///
    /// The header stores `T`'s relocate and destroy functions alongside
    /// `render`. The value is moved into the reserved slot; from then on the
    /// buffer owns it and guarantees its destroy function runs exactly once.
    pub fn push_owned<T>(&mut self, value: T, render: RenderFn)
    where
        T: Relocatable + Send + 'static,
    {
        unsafe {
            let slot = self.reserve_owned::<T>(render);
            slot.write(value);
        }
    }

    /// Reserves an owned-entry slot and returns its uninitialized payload
    /// address for the caller to construct into.
    ///
    /// Capacity is ensured before the header is written, so any relocation of
    /// prior entries has already happened by the time the slot address is
    /// returned: the newly constructed value is never itself relocated
    /// mid-construction.
    ///
    /// # Safety
    ///
    /// The caller must fully initialize the slot with a live `T` before the
    /// buffer is appended to, iterated, or dropped.
    pub unsafe fn reserve_owned<T>(&mut self, render: RenderFn) -> *mut T
    where
        T: Relocatable + Send + 'static,
    {
        let ops = EntryOps::Owned {
            relocate: crate::loggable::relocate_erased::<T>,
            destroy: crate::loggable::destroy_erased::<T>,
        };
        self.reserve(Layout::new::<T>(), render, ops) as *mut T
    }

    /// Writes a header for the next entry and returns the payload slot.
    fn reserve(&mut self, payload: Layout, render: RenderFn, ops: EntryOps) -> *mut u8 {
        let header_at = align_up(self.cursor, HEADER_ALIGN);
        let payload_at = align_up(header_at + HEADER_SIZE, payload.align());
        let end = payload_at + payload.size();

        if end > self.cap || payload.align() > self.align {
            self.grow(end, payload.align());
        }

        let header = EntryHeader {
            size: payload.size(),
            align: payload.align(),
            render,
            ops,
        };
        unsafe {
            (self.ptr.add(header_at) as *mut EntryHeader).write(header);
            self.cursor = end;
            self.len += 1;
            self.ptr.add(payload_at)
        }
    }

    /// Reallocates to hold at least `required` bytes at `payload_align` (or
    /// stronger) alignment and replays every existing entry, in order, into
    /// the new region.
    ///
    /// Entry offsets are preserved: alignment only ever grows, so the padding
    /// computed from offsets at write time stays valid against the new base.
    /// The old region is released only after every entry has been relocated.
    /// Allocation failure aborts before any entry is touched, leaving the old
    /// buffer fully intact.
    fn grow(&mut self, required: usize, payload_align: usize) {
        let new_align = self.align.max(payload_align);
        let mut new_cap = (self.cap * 2).max(MIN_CAP);
        if new_cap < required {
            new_cap = required;
        }

        let layout = match Layout::from_size_align(new_cap, new_align) {
            Ok(layout) => layout,
            Err(_) => panic!("argument buffer capacity overflow"),
        };
        let new_ptr = unsafe { alloc::alloc(layout) };
        if new_ptr.is_null() {
            alloc::handle_alloc_error(layout);
        }

        let mut offset = 0;
        for _ in 0..self.len {
            let header_at = align_up(offset, HEADER_ALIGN);
            unsafe {
                let header = *(self.ptr.add(header_at) as *const EntryHeader);
                let payload_at = align_up(header_at + HEADER_SIZE, header.align);

                ptr::copy_nonoverlapping(
                    self.ptr.add(header_at),
                    new_ptr.add(header_at),
                    HEADER_SIZE,
                );
                match header.ops {
                    EntryOps::Trivial => ptr::copy_nonoverlapping(
                        self.ptr.add(payload_at),
                        new_ptr.add(payload_at),
                        header.size,
                    ),
                    EntryOps::Owned { relocate, .. } => {
                        // The relocate function consumes the old copy; it
                        // will not receive a destroy call.
                        relocate(self.ptr.add(payload_at), new_ptr.add(payload_at));
                    }
                }
                offset = payload_at + header.size;
            }
        }

        if self.cap != 0 {
            unsafe {
                alloc::dealloc(self.ptr, Layout::from_size_align_unchecked(self.cap, self.align));
            }
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
        self.align = new_align;
    }

    /// Walks the buffer front to back, yielding a render-ready handle per
    /// entry in append order.
    ///
    /// The walk is read-only and idempotent: it mutates nothing, destroys
    /// nothing, and may run any number of times while the buffer is alive.
    pub fn iter(&self) -> Args<'_> {
        Args {
            buf: self,
            offset: 0,
            remaining: self.len,
        }
    }
}

impl Default for ArgBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ArgBuffer {
    fn drop(&mut self) {
        let mut offset = 0;
        for _ in 0..self.len {
            let header_at = align_up(offset, HEADER_ALIGN);
            unsafe {
                let header = *(self.ptr.add(header_at) as *const EntryHeader);
                let payload_at = align_up(header_at + HEADER_SIZE, header.align);
                if let EntryOps::Owned { destroy, .. } = header.ops {
                    destroy(self.ptr.add(payload_at));
                }
                offset = payload_at + header.size;
            }
        }
        if self.cap != 0 {
            unsafe {
                alloc::dealloc(self.ptr, Layout::from_size_align_unchecked(self.cap, self.align));
            }
        }
    }
}

/// Iterator over the render-ready handles of an [`ArgBuffer`].
///
/// Recomputes header and payload offsets with the same alignment rule used by
/// the write path.
pub struct Args<'a> {
    buf: &'a ArgBuffer,
    offset: usize,
    remaining: usize,
}

impl<'a> Iterator for Args<'a> {
    type Item = RenderArg<'a>;

    fn next(&mut self) -> Option<RenderArg<'a>> {
        if self.remaining == 0 {
            return None;
        }
        let header_at = align_up(self.offset, HEADER_ALIGN);
        unsafe {
            let header = *(self.buf.ptr.add(header_at) as *const EntryHeader);
            let payload_at = align_up(header_at + HEADER_SIZE, header.align);
            self.offset = payload_at + header.size;
            self.remaining -= 1;
            Some(RenderArg {
                ptr: self.buf.ptr.add(payload_at),
                render: header.render,
                _buf: PhantomData,
            })
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Args<'_> {}

/// A render-ready handle for one buffered argument.
///
/// Pairs the payload address with the render-reconstruction function stored
/// in the entry header; `Display` drives that function, so a handle can be
/// formatted like any other value. The handle borrows the buffer and never
/// outlives it.
pub struct RenderArg<'a> {
    ptr: *const u8,
    render: RenderFn,
    _buf: PhantomData<&'a ArgBuffer>,
}

impl RenderArg<'_> {
    /// Raw payload address, mainly useful to adapters and tests that need to
    /// check placement (e.g. alignment) of their own payloads.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }
}

impl fmt::Display for RenderArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Safety: the pointer and function come from a fully written entry
        // header and the handle's lifetime pins the buffer.
        unsafe { (self.render)(self.ptr, f) }
    }
}
