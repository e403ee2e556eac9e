fn main() {
    conform::cli::run();
}
