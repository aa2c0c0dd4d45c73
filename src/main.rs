fn main() {
    std::process::exit(verity::cli::run());
}
