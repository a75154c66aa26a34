use bytes::Bytes;

use super::commands::ImageSlot;
use super::open_wiki;

pub async fn run_image_add(
    data_dir: String,
    file: String,
    set: Option<ImageSlot>,
) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {file}: {e}"))?;

    let key = match wiki.upload_image(Bytes::from(bytes), None).await {
        Ok(key) => key,
        Err(e) => anyhow::bail!("{}", e.user_message()),
    };
    let key = key.as_str();

    match set {
        Some(ImageSlot::Logo) => wiki.set_logo(Some(key))?,
        Some(ImageSlot::AuthBanner) => wiki.set_auth_banner(Some(key))?,
        Some(ImageSlot::SynopsisBanner) => wiki.set_synopsis_banner(Some(key))?,
        Some(ImageSlot::HomeBackground) => wiki.set_home_background(Some(key))?,
        Some(ImageSlot::CharactersBackground) => wiki.set_characters_background(Some(key))?,
        None => {}
    }

    println!("{key}");
    Ok(())
}
