//! Binary entrypoint for the `magnet-remote` CLI.

#[tokio::main]
async fn main() {
    let exit_code = magnet_remote_cli::run().await;
    std::process::exit(exit_code);
}
