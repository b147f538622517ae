mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;

use common::TEST_API_KEY;

#[tokio::test]
async fn oversized_payload_is_rejected() -> Result<()> {
    let server = common::spawn_server_with_env(&[("MAX_UPLOAD_BYTES", "1024")]).await?;
    let client = reqwest::Client::new();

    // Noise does not compress; this is well above the 1 KiB cap
    let form = common::image_form(common::noise_png(256, 256), "image/png", "big.png")?;
    let res = client
        .post(format!("{}/optimize", server.base_url))
        .header("X-API-Key", TEST_API_KEY)
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");

    Ok(())
}

#[tokio::test]
async fn rate_limit_rejects_over_ceiling_and_rolls_over() -> Result<()> {
    let server = common::spawn_server_with_env(&[
        ("RATE_LIMIT_MAX_REQUESTS", "2"),
        ("RATE_LIMIT_WINDOW_SECS", "1"),
    ])
    .await?;
    let client = reqwest::Client::new();

    let post = |bytes: Vec<u8>| {
        let client = client.clone();
        let url = format!("{}/optimize", server.base_url);
        async move {
            let form = common::image_form(bytes, "image/png", "img.png")?;
            let res = client
                .post(url)
                .header("X-API-Key", TEST_API_KEY)
                .multipart(form)
                .send()
                .await?;
            anyhow::Ok(res)
        }
    };

    let png = common::sample_png(16, 16);
    assert_eq!(post(png.clone()).await?.status(), StatusCode::OK);
    assert_eq!(post(png.clone()).await?.status(), StatusCode::OK);

    // Ceiling reached within the window
    let res = post(png.clone()).await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "TOO_MANY_REQUESTS");

    // First request after the window rolls over succeeds again
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(post(png).await?.status(), StatusCode::OK);

    Ok(())
}
