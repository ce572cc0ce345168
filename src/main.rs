use signlat::app::run::main_with_error;
use signlat::cli::env_config::ConfigError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = main_with_error().await {
        if e.downcast_ref::<ConfigError>().is_some() {
            eprintln!("{}", e);
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
