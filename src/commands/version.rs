//! Version command

/// Run the version command.
pub fn run() {
    println!("stemprep {}", env!("CARGO_PKG_VERSION"));
}
