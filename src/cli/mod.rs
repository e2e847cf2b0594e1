use crate::config::Config;
use crate::core::RecordKind;
use crate::extractors;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitegrab")]
#[command(about = "Extract video metadata from supported sites")]
#[command(version)]
pub struct Cli {
    /// URL to extract
    #[arg(value_name = "URL")]
    pub url: String,

    /// Print the full media record as JSON
    #[arg(short = 'j', long)]
    pub dump_json: bool,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        if self.verbose {
            println!("Verbose mode enabled");
        }

        let config = Config::load(self.config.as_deref())?;
        let mut engine = extractors::default_engine(&config);

        let record = engine.extract(&self.url).await?;

        if self.dump_json {
            println!("{}", serde_json::to_string_pretty(&record)?);
            return Ok(());
        }

        println!("Title: {}", record.title);
        if let Some(uploader) = &record.uploader {
            println!("Uploader: {}", uploader);
        }
        if let Some(series) = &record.series {
            println!("Series: {}", series);
        }
        if let Some(duration) = record.duration {
            println!("Duration: {}s", duration);
        }

        if record.kind == RecordKind::MultiVideo {
            println!("Parts: {}", record.entries.len());
            for (i, entry) in record.entries.iter().enumerate() {
                println!("  {}: {} ({})", i + 1, entry.title, entry.id);
            }
            return Ok(());
        }

        println!("Available formats: {}", record.formats.len());
        for (i, format) in record.formats.iter().enumerate().take(5) {
            let quality = format
                .height
                .map(|h| format!("{}p", h))
                .or_else(|| format.tbr.map(|t| format!("{}k", t)))
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "  {}: {} - {} ({})",
                i + 1,
                format.format_id,
                quality,
                format.ext.as_deref().unwrap_or("?")
            );
        }

        if !record.subtitles.is_empty() {
            let languages: Vec<_> = record.subtitles.keys().cloned().collect();
            println!("Subtitles: {}", languages.join(", "));
        }

        Ok(())
    }
}
