use std::fmt::Write;

use crate::arg_buffer::Args;
use crate::diag;

/// Pattern interpolation driver for the decode/render loop.
///
/// The per-value formatting itself is `std::fmt`'s job (each render-ready
/// handle implements `Display`); this module only walks the pattern and
/// splices the handles in.

/// Substituted for an argument whose render function reports a failure.
pub const RENDER_ERROR: &str = "<render error>";

/// Substituted for a placeholder with no matching argument.
pub const MISSING: &str = "{MISSING}";

/// Interpolates `{}` placeholders in `pattern` with the buffered arguments,
/// in order. `{{` and `}}` escape literal braces. Placeholders beyond the
/// last argument render as `{MISSING}`; surplus arguments are ignored.
///
/// Render failures never propagate out of this loop: the failing argument is
/// replaced with a fixed placeholder and the failure is reported through the
/// diagnostic side-channel only.
pub(crate) fn render_pattern(pattern: &str, mut args: Args<'_>) -> String {
    let mut out = String::with_capacity(pattern.len() + 16 * args.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' if chars.peek() == Some(&'}') => {
                chars.next();
                match args.next() {
                    Some(arg) => {
                        if write!(out, "{}", arg).is_err() {
                            out.push_str(RENDER_ERROR);
                            diag::report(format_args!(
                                "argument render failed for pattern {:?}",
                                pattern
                            ));
                        }
                    }
                    None => out.push_str(MISSING),
                }
            }
            _ => out.push(c),
        }
    }

    out
}
