use crate::store::ProgressFn;

use super::open_wiki;
use super::snapshot::print_progress;

/// How a share link carries its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareFormat {
    /// Upload to the paste host unless small enough to embed
    #[default]
    Hosted,
    /// Embed the compressed payload in the link
    Inline,
    /// Embed uncompressed base64, readable by older builds
    Legacy,
}

pub async fn run_share(data_dir: String, format: ShareFormat) -> anyhow::Result<()> {
    let (config, wiki) = open_wiki(&data_dir)?;
    let transport = wiki.configured_share_transport(&config)?;

    let progress: Option<ProgressFn<'_>> = Some(&print_progress);
    let result = match format {
        ShareFormat::Hosted => transport.share_link(progress).await,
        ShareFormat::Inline => transport.compressed_link(progress).await,
        ShareFormat::Legacy => transport.legacy_link(progress).await,
    };

    match result {
        Ok(link) => {
            println!("{link}");
            Ok(())
        }
        Err(e) if e.is_share_failure() => {
            anyhow::bail!("{}\n{e}", e.user_message())
        }
        Err(e) => Err(e.into()),
    }
}

/// Imports whatever a share link points at, replacing current data.
pub async fn run_open(data_dir: String, url: String) -> anyhow::Result<()> {
    let (config, wiki) = open_wiki(&data_dir)?;
    let transport = wiki.configured_share_transport(&config)?;

    let consumed = transport.consume_url(&url).await;
    match consumed.outcome {
        None => anyhow::bail!("No share data found in {url}"),
        Some(Err(e)) => anyhow::bail!("{}\n{e}", e.user_message()),
        Some(Ok(summary)) => {
            println!(
                "Imported {} records and {} images",
                summary.records_written, summary.images_written
            );
            println!("Open {}", consumed.clean_url);
            Ok(())
        }
    }
}
