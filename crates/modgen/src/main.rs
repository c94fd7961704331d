//! The `modgen` binary.

fn main() {
    let args: Vec<String> = std::env::args().collect();
    std::process::exit(modgen_cli::run_cli(args));
}
