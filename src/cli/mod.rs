pub mod build;
pub mod embed;
pub mod export;
pub mod lexicon;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use episodic::config::EmbeddingConfig;
use episodic::embedding::local::{model_files, MODEL_FILE, TOKENIZER_FILE};

const MODEL_BASE_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Fetch the ONNX model and tokenizer into the configured cache directory.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let cache_dir = episodic::config::expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    let (model_path, tokenizer_path) = model_files(&cache_dir);
    let files = [
        (format!("{MODEL_BASE_URL}/onnx/{MODEL_FILE}"), model_path),
        (format!("{MODEL_BASE_URL}/{TOKENIZER_FILE}"), tokenizer_path),
    ];

    for (url, dest) in &files {
        if dest.exists() {
            println!("Already present: {}", dest.display());
            continue;
        }
        println!("Downloading {url}");
        download_file(url, dest).await?;
        println!("Saved to {}", dest.display());
    }

    println!("Model '{}' ready.", config.model);
    Ok(())
}

/// Download a file with a progress bar, writing to `<dest>.tmp` then renaming.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => bar(size, "  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})"),
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}

/// A progress bar with the given template, falling back to the default style.
pub(crate) fn bar(len: u64, template: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    ProgressBar::new(len).with_style(style)
}
