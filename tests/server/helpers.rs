use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, Rgb};
use reqwest::Client;
use tinydreamers::application::routes::app_router;
use tinydreamers::application::state::{AppState, AppStateConfig};
use tokio::net::TcpListener;
use tokio::task::AbortHandle;
use wiremock::MockServer;

pub const GOOGLE_KEY: &str = "test-google-key";
pub const GOOGLE_CX: &str = "test-engine";
pub const SERVICE_KEY: &str = "test-service-key";

pub struct TestApp {
    pub address: String,
    pub client: Client,
    /// Stands in for the Google Custom Search API.
    pub google: MockServer,
    /// Stands in for the storage/database platform.
    pub platform: MockServer,
    /// Serves the source cover images.
    pub images: MockServer,
    server_handle: AbortHandle,
}

impl TestApp {
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{name}", self.address)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_app() -> TestApp {
    let google = MockServer::start().await;
    let platform = MockServer::start().await;
    let images = MockServer::start().await;

    let state = AppState::new(AppStateConfig {
        http_client: Client::new(),
        google_api_url: google.uri(),
        google_api_key: GOOGLE_KEY.to_string(),
        google_engine_id: GOOGLE_CX.to_string(),
        storage_url: platform.uri(),
        storage_key: SERVICE_KEY.to_string(),
    })
    .expect("Failed to build app state");

    let app = app_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let local_addr = listener.local_addr().expect("Failed to get local address");
    let address = format!("http://{local_addr}");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Server failed to start");
    })
    .abort_handle();

    TestApp {
        address,
        client: Client::new(),
        google,
        platform,
        images,
        server_handle,
    }
}

/// A small gradient PNG, encoded with the image crate.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}
