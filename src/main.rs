fn main() {
    use clap::Parser;
    let args = comicbox::cli::fetch::FetchArgs::parse();
    if let Err(e) = comicbox::cli::fetch::run(&args) {
        comicbox::cli::report_error(&e, args.debug);
        std::process::exit(e.exit_code());
    }
}
