fn main() {
    refill_lib::init_tracing();

    let seed = std::env::args().skip(1).any(|arg| arg == "--sample-data");
    if let Err(e) = refill_lib::run(seed) {
        tracing::error!(error = %e, "Refill failed");
        std::process::exit(1);
    }
}
