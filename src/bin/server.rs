//! Study Genius server binary.
//! Run with: cargo run --bin study-genius-server

use std::process::ExitCode;

use study_genius::start_study_genius;

fn main() -> ExitCode {
    start_study_genius::run()
}
