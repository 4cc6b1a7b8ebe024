fn main() {
    #[cfg(feature = "cli")]
    lbin::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("lbin: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
