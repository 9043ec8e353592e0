//! docforge CLI binary
//!
//! All logic lives in the library; main only maps the result to an exit code.

fn main() {
    if let Err(code) = docforge::cli::run() {
        std::process::exit(code.as_i32());
    }
}
