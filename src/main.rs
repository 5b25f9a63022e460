use anyhow::Result;
use prism_perf::cli;

// Main entry point
fn main() -> Result<()> {
    cli::handle_calls()
}
