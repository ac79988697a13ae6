use clap::Parser;

use agri_chat::config::Config;
use agri_chat::routes;
use agri_chat::server::Server;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let server = Server::in_memory();
    let routes = routes::routes(server, config.static_dir.clone());

    match config.tls() {
        Some(tls) => {
            log::info!("Starting secure server (HTTPS/WSS) on {}", config.bind);
            warp::serve(routes)
                .tls()
                .cert_path(&tls.cert)
                .key_path(&tls.key)
                .run(config.bind)
                .await;
        }
        None => {
            if config.tls_cert.is_some() {
                log::warn!("TLS material unusable, falling back to HTTP/WS");
            }
            log::info!("Starting server (HTTP/WS) on {}", config.bind);
            warp::serve(routes).run(config.bind).await;
        }
    }
}
