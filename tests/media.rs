use base64::{Engine as _, engine::general_purpose::STANDARD};
use foodgram::{
    error::AppError,
    services::media::{decode_image, discard_on_error, image_url, remove_image, store_image},
};

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[test]
fn data_uri_and_raw_base64_are_accepted() -> anyhow::Result<()> {
    let encoded = STANDARD.encode(PNG_HEADER);

    let from_uri = decode_image(&format!("data:image/png;base64,{encoded}"))?;
    assert_eq!(from_uri.extension, "png");
    assert_eq!(from_uri.bytes, PNG_HEADER);

    let raw = decode_image(&encoded)?;
    assert_eq!(raw, from_uri);
    Ok(())
}

#[test]
fn format_is_sniffed_from_bytes() -> anyhow::Result<()> {
    let jpeg = STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]);
    // declared mime type is ignored
    let image = decode_image(&format!("data:image/png;base64,{jpeg}"))?;
    assert_eq!(image.extension, "jpg");
    Ok(())
}

#[test]
fn invalid_payloads_are_bad_requests() {
    let not_image = STANDARD.encode(b"plain text, not an image");
    for payload in [
        "",
        "data:image/png;base64",
        "data:image/png,AAAA",
        "%%%not-base64%%%",
        not_image.as_str(),
    ] {
        assert!(
            matches!(decode_image(payload), Err(AppError::BadRequest(_))),
            "payload {payload:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn stored_image_lands_under_media_root() -> anyhow::Result<()> {
    let root = std::env::temp_dir().join(format!("foodgram-media-{}", uuid::Uuid::new_v4()));
    let root = root.to_string_lossy().to_string();
    let image = decode_image(&STANDARD.encode(PNG_HEADER))?;

    let relative = store_image(&root, &image).await?;
    assert!(relative.starts_with("recipes/"));
    assert!(relative.ends_with(".png"));
    assert_eq!(image_url(&relative), format!("/media/{relative}"));

    let path = std::path::Path::new(&root).join(&relative);
    assert_eq!(tokio::fs::read(&path).await?, PNG_HEADER);

    remove_image(&root, &relative).await;
    assert!(!path.exists());
    tokio::fs::remove_dir_all(&root).await?;
    Ok(())
}

#[tokio::test]
async fn failed_write_discards_the_stored_image() -> anyhow::Result<()> {
    let root = std::env::temp_dir().join(format!("foodgram-media-{}", uuid::Uuid::new_v4()));
    let root = root.to_string_lossy().to_string();
    let image = decode_image(&STANDARD.encode(PNG_HEADER))?;

    let kept = store_image(&root, &image).await?;
    let value = discard_on_error(&root, Some(&kept), Ok(7)).await?;
    assert_eq!(value, 7);
    assert!(std::path::Path::new(&root).join(&kept).exists());

    let orphan = store_image(&root, &image).await?;
    let failed: Result<(), AppError> = Err(AppError::Internal(anyhow::anyhow!("commit failed")));
    let err = discard_on_error(&root, Some(&orphan), failed).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    assert!(!std::path::Path::new(&root).join(&orphan).exists());

    tokio::fs::remove_dir_all(&root).await?;
    Ok(())
}
