#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

pub const TEST_API_KEY: &str = "test-api-key";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub temp_dir: PathBuf,
    child: Child,
    // Keeps the artifact directory alive for the server's lifetime
    _temp_guard: tempfile::TempDir,
}

impl TestServer {
    fn spawn(extra_env: &[(&str, &str)]) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let temp_guard = tempfile::tempdir().context("failed to create temp dir")?;
        let temp_dir = temp_guard.path().to_path_buf();

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_image-optimizer"));
        cmd.env("PORT", port.to_string())
            .env("API_KEY", TEST_API_KEY)
            .env("TEMP_DIR", &temp_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            temp_dir,
            child,
            _temp_guard: temp_guard,
        })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

/// Shared server for tests that only need default configuration.
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server =
        SERVER.get_or_init(|| TestServer::spawn(&[]).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Dedicated server with custom env, for tests that tweak limits.
pub async fn spawn_server_with_env(extra_env: &[(&str, &str)]) -> Result<TestServer> {
    let server = TestServer::spawn(extra_env)?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Synthesize a gradient JPEG of the given dimensions.
pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode_sample(width, height, image::ImageFormat::Jpeg)
}

/// Synthesize a gradient PNG of the given dimensions.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    encode_sample(width, height, image::ImageFormat::Png)
}

/// Synthesize a noise PNG; incompressible, useful for size-limit tests.
pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(2_654_435_761).wrapping_add(y.wrapping_mul(40_503));
        image::Rgb([(v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, ((v >> 16) & 0xFF) as u8])
    }));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode sample image");
    buf.into_inner()
}

fn encode_sample(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode sample image");
    buf.into_inner()
}

/// Build a multipart form with the upload under the `image` field.
pub fn image_form(bytes: Vec<u8>, mime: &str, filename: &str) -> Result<reqwest::multipart::Form> {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(mime)?;
    Ok(reqwest::multipart::Form::new().part("image", part))
}
