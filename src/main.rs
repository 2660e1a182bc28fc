use clap::Parser;
use env_logger::Target;
use grading_lib::cfg::is_debug_mode;
use grading_lib::cli::Cli;
use log::debug;

fn setup_logging() {
    let default_filter = if is_debug_mode() { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", default_filter))
        .target(Target::Stderr)
        .init();
}

fn main() {
    setup_logging();

    let cli = Cli::parse();
    debug!("Parsed arguments: {cli:?}");

    match cli.execute() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}
