//! Thread creation stress test
mod config;
mod counters;
mod error;
mod harness;
mod progress;
mod spawn;

fn main() {
    eprintln!("Stress testing thread creation...");

    if let Err(err) = harness::thread_creation() {
        eprintln!("{err:?}");
        std::process::abort();
    }
}
