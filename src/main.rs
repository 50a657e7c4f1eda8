fn main() {
    // A `.env` file is optional; real environment variables win.
    dotenvy::dotenv().ok();
    rayband::init_tracing();

    if let Err(e) = rayband::run() {
        tracing::error!("RayBand failed: {e}");
        std::process::exit(1);
    }
}
