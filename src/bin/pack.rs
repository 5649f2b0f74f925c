fn main() {
    use clap::Parser;
    let args = comicbox::cli::pack::PackArgs::parse();
    if let Err(e) = comicbox::cli::pack::run(&args) {
        comicbox::cli::report_error(&e, args.debug);
        std::process::exit(e.exit_code());
    }
}
