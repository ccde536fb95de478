//! # Deferred Log
//!
//! A low-latency logging record builder. A log statement captures its format
//! pattern plus an arbitrary, heterogeneous sequence of argument values into
//! a single growable byte buffer at the call site; the expensive work of
//! string formatting is deferred, possibly until after the record has been
//! handed off to another thread.
//!
//! ## Key Features
//!
//! * No virtual dispatch and no per-argument heap boxing: arguments are
//!   stored inline with a small type-erased header per entry
//! * Byte-relocatable values (scalars, plain structs) append as a raw byte
//!   copy; everything else carries explicit relocate/destroy behavior
//! * Buffer growth relocates every entry safely, preserving order, count and
//!   the destroy-exactly-once guarantee
//! * Rendering is read-only and idempotent; records are `Send` so formatting
//!   and I/O can run on a background writer thread
//!
//! ## Main Components
//!
//! * `Record`: the outward-facing unit (pattern + metadata + argument buffer)
//! * `ArgBuffer`: the owned, growable byte store behind every record
//! * `Loggable` / `ByteRelocatable` / `Relocatable`: the per-type append
//!   contract that picks the storage path at compile time
//! * `diag`: self-contained error-reporting path for argument adapters
//!
//! ## Quick Start
//!
//! ```
//! use deferred_log::{record, Level};
//!
//! // Capture now, format later. Arguments are serialized into the record's
//! // buffer; no text is produced yet.
//! let mut rec = record!(Level::Info, "Temperature: {} C", 25.5);
//! rec.arg(42u32); // surplus arguments are simply ignored by this pattern
//!
//! // Rendering may happen any time later, on any thread that owns the record.
//! assert_eq!(rec.render(), "Temperature: 25.5 C");
//! assert_eq!(rec.render(), rec.render());
//! ```
//!
//! ## Thread model
//!
//! A record is mutated only by the thread building it; the buffer has no
//! internal synchronization. Hand-off is an exclusive ownership transfer
//! (typically through a channel), never shared access. See [`Record`] for a
//! worked example.

pub mod arg_buffer;
pub mod clock;
pub mod diag;
pub mod loggable;
pub mod record;
pub mod render;

pub use arg_buffer::{ArgBuffer, Args, DestroyFn, RelocateFn, RenderArg, RenderFn};
pub use loggable::{ByteRelocatable, Loggable, Relocatable};
pub use record::{Level, Record};
