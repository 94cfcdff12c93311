//! Command handlers. Each one runs a single collection and reports on it.

use std::path::Path;
use std::sync::Arc;

use chanstat_collector::{
    export_to_file, ChannelCollector, CollectorConfig, HttpChannelClient,
};
use chanstat_core::AppConfig;
use chanstat_llm::{analyze_comments, analyze_post_at, OpenAiCompatClient};

type Collector = ChannelCollector<HttpChannelClient>;

/// Resolve the channel argument, run one collection and hand back the
/// populated collector together with the channel that was used.
async fn collect(
    config: &AppConfig,
    channel: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<(String, Collector)> {
    let channel = config
        .channel_or_default(channel)
        .ok_or_else(|| {
            anyhow::anyhow!("no channel given and CHANSTAT_DEFAULT_CHANNEL is not set")
        })?
        .to_string();
    let limit = limit.unwrap_or(config.collect_limit);

    let client = Arc::new(HttpChannelClient::from_config(config)?);
    let mut collector = ChannelCollector::new(client, CollectorConfig::from_app_config(config));
    collector.collect(&channel, limit).await?;
    Ok((channel, collector))
}

pub(crate) async fn run_collect(
    config: &AppConfig,
    channel: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let (channel, collector) = collect(config, channel, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(collector.records())?);
        return Ok(());
    }

    let summary = collector.summary();
    println!(
        "collected {} posts from {channel}: {} views, {} likes, {} comments, avg engagement {:.2}%",
        summary.total_posts,
        summary.total_views,
        summary.total_likes,
        summary.total_comments,
        summary.avg_engagement,
    );
    Ok(())
}

pub(crate) async fn run_export(
    config: &AppConfig,
    channel: Option<&str>,
    limit: Option<usize>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let (channel, collector) = collect(config, channel, limit).await?;

    let written = export_to_file(
        collector.records(),
        Path::new("."),
        out,
        collector.collection_timestamp(),
    )
    .await?;
    let Some(path) = written else {
        println!("no records collected from {channel}; nothing exported");
        return Ok(());
    };

    println!("wrote {}", path.display());
    for (name, value) in collector.export_bundle(&channel).headers()? {
        println!("{name}: {value}");
    }
    Ok(())
}

pub(crate) async fn run_summary(
    config: &AppConfig,
    channel: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let (channel, collector) = collect(config, channel, limit).await?;

    let report = serde_json::json!({
        "channel": channel,
        "summary": collector.summary(),
        "comments": collector.comments_digest(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn run_analyze(
    config: &AppConfig,
    channel: Option<&str>,
    post: usize,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let chat = OpenAiCompatClient::from_config(config)?;
    let (_, collector) = collect(config, channel, limit).await?;

    let analysis = analyze_post_at(&chat, collector.records(), post).await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

pub(crate) async fn run_comments(
    config: &AppConfig,
    channel: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let chat = OpenAiCompatClient::from_config(config)?;
    let (_, collector) = collect(config, channel, limit).await?;

    let texts: Vec<String> = collector
        .records()
        .iter()
        .flat_map(|record| record.comment_texts.iter().cloned())
        .collect();
    let analysis = analyze_comments(&chat, &texts).await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
