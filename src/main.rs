#[tokio::main]
async fn main() {
    if let Err(err) = clipify_lib::run().await {
        eprintln!("error while running clipify: {err}");
        std::process::exit(1);
    }
}
