fn main() {
    if let Err(err) = cabinet_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
