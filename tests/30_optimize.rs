mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::TEST_API_KEY;

#[tokio::test]
async fn jpeg_to_webp_binary_scenario() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let original = common::sample_jpeg(2400, 1600);
    let original_len = original.len();
    let form = common::image_form(original, "image/jpeg", "large.jpg")?;

    let res = client
        .post(format!(
            "{}/optimize?format=webp&quality=80&maxWidth=1200&return=binary",
            server.base_url
        ))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/webp");
    assert_eq!(
        res.headers()["x-original-size"],
        original_len.to_string().as_str()
    );

    let optimized_size: usize = res.headers()["x-optimized-size"].to_str()?.parse()?;
    let savings: f64 = res.headers()["x-savings-percent"].to_str()?.parse()?;
    assert!(savings.is_finite() && savings <= 100.0);

    let body = res.bytes().await?;
    assert_eq!(body.len(), optimized_size);

    // Round-trip: fit-inside resize to width 1200, aspect ratio preserved
    let decoded = image::load_from_memory(&body)?;
    assert_eq!(decoded.width(), 1200);
    assert_eq!(decoded.height(), 800);

    Ok(())
}

#[tokio::test]
async fn small_image_is_never_upscaled() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let form = common::image_form(common::sample_png(100, 80), "image/png", "small.png")?;
    let res = client
        .post(format!(
            "{}/optimize?format=png&maxWidth=2000",
            server.base_url
        ))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let decoded = image::load_from_memory(&res.bytes().await?)?;
    assert_eq!(decoded.width(), 100);
    assert_eq!(decoded.height(), 80);

    Ok(())
}

#[tokio::test]
async fn binary_mode_output_size_is_stable() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let original = common::sample_jpeg(320, 240);
    let mut sizes = Vec::new();
    for _ in 0..2 {
        let form = common::image_form(original.clone(), "image/jpeg", "same.jpg")?;
        let res = client
            .post(format!(
                "{}/optimize?format=webp&quality=75",
                server.base_url
            ))
            .header("X-API-Key", TEST_API_KEY)
            .multipart(form)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        sizes.push(res.bytes().await?.len());
    }
    assert_eq!(sizes[0], sizes[1]);

    Ok(())
}

#[tokio::test]
async fn forged_content_type_fails_decode() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let garbage = vec![0xAB; 4096];
    let form = common::image_form(garbage, "image/jpeg", "fake.jpg")?;
    let res = client
        .post(format!("{}/optimize", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "DECODE_FAILED");

    Ok(())
}

#[tokio::test]
async fn unsupported_media_type_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let form = common::image_form(b"hello world".to_vec(), "text/plain", "note.txt")?;
    let res = client
        .post(format!("{}/optimize", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");

    Ok(())
}

#[tokio::test]
async fn missing_image_field_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let res = client
        .post(format!("{}/optimize", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "MISSING_FILE");

    Ok(())
}

#[tokio::test]
async fn non_multipart_body_is_structured_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/optimize", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .header("Content-Type", "application/json")
        .body("{}")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "MISSING_FILE");

    Ok(())
}

#[tokio::test]
async fn svg_passes_filter_but_fails_decode() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // SVG is on the MIME allowlist but there is no raster decode path
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="red"/></svg>"#;
    let form = common::image_form(svg.to_vec(), "image/svg+xml", "shape.svg")?;
    let res = client
        .post(format!("{}/optimize", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "DECODE_FAILED");

    Ok(())
}

#[tokio::test]
async fn unrecognized_format_passes_through_source_encoding() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let form = common::image_form(common::sample_jpeg(48, 48), "image/jpeg", "photo.jpg")?;
    let res = client
        .post(format!("{}/optimize?format=bmp", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    // Labeled with the requested value, bytes re-encoded in the source format
    assert_eq!(res.headers()["content-type"], "image/bmp");
    let body = res.bytes().await?;
    assert_eq!(image::guess_format(&body)?, image::ImageFormat::Jpeg);

    Ok(())
}
