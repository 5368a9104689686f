mod capture;
mod cli;
mod config;
mod event;
mod shutdown;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        println!("{e:#}");
        std::process::exit(1);
    }
}
