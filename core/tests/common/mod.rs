//! Shared setup for tests that talk to the mock upstream over real HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use mock_server::{AppState, DEFAULT_API_KEY};
use twittapi_core::{ApiClient, ClientConfig, TwitterApi};

/// Start the mock server on a random port in a background runtime.
pub fn start_server(state: AppState) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, state).await
        })
        .unwrap();
    });

    addr
}

pub fn config_for(addr: SocketAddr, api_key: &str, timeout: Duration) -> ClientConfig {
    ClientConfig::builder(api_key)
        .host(format!("http://{addr}"))
        .timeout(timeout)
        .build()
        .unwrap()
}

pub fn api_for(addr: SocketAddr) -> TwitterApi {
    let config = config_for(addr, DEFAULT_API_KEY, Duration::from_secs(5));
    TwitterApi::from_client(ApiClient::new(config))
}
