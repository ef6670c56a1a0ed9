fn main() {
    if let Err(e) = jdvault_cli::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
