mod archive;
mod cache;
mod cli;
mod config;
mod console;
mod driver;
mod env_loader;
mod error;
mod logging;
mod organize;
mod resolver;
mod schemas;
mod services;

fn main() {
    env_loader::load_dotenv();
    logging::init();

    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
