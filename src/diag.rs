use std::fmt;

use lazy_static::lazy_static;
use parking_lot::RwLock;

/// Diagnostic side-channel for argument adapters.
///
/// When an adapter's own rendering logic fails (say, a platform message
/// lookup comes back empty) it must not fail the record being rendered.
/// Instead it substitutes a placeholder in the output and reports the
/// underlying failure here, independent of any record.
///
/// By default reports go to the `log` facade at error level. Embedders and
/// tests can install a sink to capture them instead.

type Sink = Box<dyn Fn(&str) + Send + Sync>;

lazy_static! {
    static ref SINK: RwLock<Option<Sink>> = RwLock::new(None);
}

/// Installs a sink that receives all subsequent diagnostic reports,
/// replacing any previous sink.
pub fn set_sink(sink: impl Fn(&str) + Send + Sync + 'static) {
    *SINK.write() = Some(Box::new(sink));
}

/// Removes the installed sink; reports fall back to the `log` facade.
pub fn clear_sink() {
    *SINK.write() = None;
}

/// Reports an adapter-local failure.
///
/// Never touches the record being built or rendered, so a failing adapter
/// cannot recurse into its own record.
pub fn report(msg: fmt::Arguments<'_>) {
    let sink = SINK.read();
    match sink.as_ref() {
        Some(f) => f(&msg.to_string()),
        None => log::error!(target: "deferred_log", "{}", msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn sink_receives_reports() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        set_sink(move |msg| {
            assert!(msg.contains("lookup failed"));
            seen.fetch_add(1, Ordering::SeqCst);
        });

        report(format_args!("lookup failed for code {}", 9));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        clear_sink();
    }
}
