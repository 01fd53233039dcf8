//! The client library against a live server on an ephemeral port.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, Rgb, RgbImage};

use muto::client::MutoClient;
use muto::config::ServerConfig;
use muto::core::AppState;
use muto::server::router;
use muto::source::HttpSource;
use muto::storage::MemoryStorage;
use muto::utils::ClientError;

struct Server {
    api: String,
    source: String,
    _dir: tempfile::TempDir,
}

fn start_server() -> Server {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("source.png");
    let image = RgbImage::from_fn(120, 80, |x, y| Rgb([x as u8, y as u8, 200]));
    DynamicImage::ImageRgb8(image).save(&path).expect("save");

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let base = format!("http://{}", listener.local_addr().expect("addr"));

    let state = AppState::with_parts(
        ServerConfig::default(),
        Arc::new(
            HttpSource::new(Duration::from_secs(5), 10 * 1024 * 1024).with_file_sources(true),
        ),
        Arc::new(MemoryStorage::new(format!("{base}/results"))),
    );

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
            axum::serve(listener, router(state)).await.expect("serve");
        });
    });

    Server {
        api: format!("{base}/api/v1"),
        source: format!("file://{}", path.display()),
        _dir: dir,
    }
}

#[test]
fn process_and_fetch_round_trip() {
    let server = start_server();
    let mut client = MutoClient::new(&server.api);
    client
        .from_url(&server.source)
        .format("jpeg")
        .compression_quality(80)
        .resize()
        .kwarg("width", 60)
        .kwarg("height", 40)
        .bind()
        .expect("resize")
        .flop()
        .bind()
        .expect("flop");

    let processed = client.process().expect("process");
    assert_eq!(processed.original.dimensions, (120, 80));
    assert_eq!(processed.result.dimensions, (60, 40));
    assert_eq!(processed.result.format, "JPEG");

    let bytes = processed.fetch().expect("fetch");
    assert_eq!(bytes.len() as u64, processed.filesize);
    let decoded = image::load_from_memory(&bytes).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (60, 40));
}

#[test]
fn server_failures_surface_code_and_description() {
    let server = start_server();
    let mut client = MutoClient::new(&server.api);
    client
        .from_url(&server.source)
        .crop()
        .kwarg("left", 500)
        .bind()
        .expect("crop");

    match client.process() {
        Err(ClientError::Server { code, description }) => {
            assert_eq!(code, 422);
            assert!(description.contains("crop"));
        }
        other => panic!("unexpected {other:?}"),
    }
}
