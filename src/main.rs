use std::sync::mpsc;
use std::thread;

use deferred_log::{record, Level, Record};

/// Small demo: records are built on the main thread and handed off, whole,
/// to a background writer that does all the formatting and I/O.
fn main() {
    let (tx, rx) = mpsc::channel::<Record>();

    let writer = thread::spawn(move || {
        for rec in rx {
            println!(
                "[{}] {}:{} {}",
                rec.level(),
                rec.file(),
                rec.line(),
                rec.render()
            );
        }
    });

    for i in 0..5u32 {
        let mut rec = record!(Level::Info, "worker {} processed {} items ({})", i, i * 3);
        rec.arg(format!("batch-{}", i));
        tx.send(rec).expect("writer thread alive");
    }
    tx.send(record!(Level::Warn, "shutting down")).expect("writer thread alive");

    drop(tx);
    writer.join().expect("writer thread panicked");
}
