use std::borrow::Cow;
use std::fmt;
use std::ptr;

use crate::arg_buffer::ArgBuffer;

/// Append dispatch for the argument buffer.
///
/// Every value that can be captured by a record goes through one of two
/// paths, chosen at compile time by the value's type: byte-relocatable values
/// are copied into the buffer verbatim, while owned values carry explicit
/// relocate and destroy behavior with them.

/// Marker for values whose bytes can be copied verbatim to a new location
/// with no construct or destroy step.
///
/// # Safety
///
/// Implementors must guarantee that a raw byte copy of the value is a valid,
/// independent value and that dropping the original (or never dropping the
/// copy) releases nothing. `Copy` types with no interior pointers into their
/// own storage satisfy this; all the primitive scalars do.
pub unsafe trait ByteRelocatable: Copy {}

/// Contract for values the buffer must relocate and destroy explicitly.
///
/// The default methods cover every ordinary Rust type: relocation is a plain
/// move of the bytes (a Rust move never fails and never runs user code) and
/// destruction is `drop_in_place`. Types that need to observe their own
/// relocation, or that can only be duplicated rather than moved, override
/// `relocate`.
///
/// `relocate` consumes the source: after it returns, the slot at `src` is
/// dead and the buffer will not invoke `destroy` on it. A copy-only type
/// therefore clones into `dst` and retires the stale copy itself:
///
/// ```
/// # use deferred_log::Relocatable;
/// struct CloneOnly(String);
///
/// impl Relocatable for CloneOnly {
///     unsafe fn relocate(src: *mut Self, dst: *mut Self) {
///         dst.write(CloneOnly((*src).0.clone()));
///         std::ptr::drop_in_place(src);
///     }
/// }
/// ```
///
/// Because relocation consumes the source, each logical value receives
/// exactly one `destroy` call over the record's lifetime, at teardown.
pub trait Relocatable: Sized {
    /// Moves or copies the value at `src` into the uninitialized slot at
    /// `dst`, ending the lifetime of the value at `src`.
    ///
    /// # Safety
    ///
    /// `src` must hold a live `Self`; `dst` must be valid, suitably aligned
    /// uninitialized storage for a `Self`. Must not fail or panic.
    unsafe fn relocate(src: *mut Self, dst: *mut Self) {
        dst.write(src.read());
    }

    /// Destroys the value in place.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live `Self`. Invoked exactly once per value.
    unsafe fn destroy(slot: *mut Self) {
        ptr::drop_in_place(slot);
    }
}

/// Type-erased trampolines stored in owned entry headers.
pub(crate) unsafe fn relocate_erased<T: Relocatable>(src: *mut u8, dst: *mut u8) {
    T::relocate(src as *mut T, dst as *mut T);
}

pub(crate) unsafe fn destroy_erased<T: Relocatable>(slot: *mut u8) {
    T::destroy(slot as *mut T);
}

/// Render-reconstruction function for any `Display` type: rebuilds a typed
/// reference from the payload address and formats it.
///
/// This is the render function to pass to
/// [`push_trivial`](ArgBuffer::push_trivial) and
/// [`push_owned`](ArgBuffer::push_owned) for values rendered through their
/// `Display` impl.
///
/// # Safety
///
/// Must only be invoked with the address of a live payload of type `T`. The
/// buffer guarantees this when the function is stored at append time for the
/// same `T`.
pub unsafe fn render_display<T: fmt::Display>(
    ptr: *const u8,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    fmt::Display::fmt(&*(ptr as *const T), f)
}

/// A value that can be captured into a record's argument buffer.
///
/// Implementations pick the append path for their type. Byte-relocatable
/// types go through [`ArgBuffer::push_trivial`]; everything else goes through
/// [`ArgBuffer::push_owned`] with a [`Relocatable`] impl. Custom argument
/// adapters implement this trait (plus, for the owned path, `Relocatable`)
/// and get no other access to buffer internals.
pub trait Loggable {
    /// Appends `self` to the buffer, choosing the path for this type.
    fn append_to(self, buf: &mut ArgBuffer);
}

macro_rules! byte_relocatable {
    ($($ty:ty),* $(,)?) => {$(
        unsafe impl ByteRelocatable for $ty {}

        impl Loggable for $ty {
            fn append_to(self, buf: &mut ArgBuffer) {
                buf.push_trivial(self, render_display::<$ty>);
            }
        }
    )*};
}

byte_relocatable!(
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64, bool, char,
    &'static str,
);

impl Relocatable for String {}

impl Loggable for String {
    fn append_to(self, buf: &mut ArgBuffer) {
        buf.push_owned(self, render_display::<String>);
    }
}

impl Relocatable for Cow<'static, str> {}

impl Loggable for Cow<'static, str> {
    fn append_to(self, buf: &mut ArgBuffer) {
        buf.push_owned(self, render_display::<Cow<'static, str>>);
    }
}
