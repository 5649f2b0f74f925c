fn main() {
    use clap::Parser;
    let args = comicbox::cli::ebook::EbookArgs::parse();
    if let Err(e) = comicbox::cli::ebook::run(&args) {
        comicbox::cli::report_error(&e, args.debug);
        std::process::exit(e.exit_code());
    }
}
