//! The `claimlens analyze` command for assessing damage photos.

use clap::{Args, ValueEnum};
use claimlens_core::output::OutputFormat as CoreOutputFormat;
use claimlens_core::{
    Analyzer, BatchResult, Config, DamageReport, Engine, OutputWriter, ReportLanguage,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file or directory to analyze
    #[arg(required = true)]
    pub input: PathBuf,

    /// Vision engine to query
    #[arg(long, value_enum, default_value = "openai")]
    pub engine: EngineArg,

    /// Language the report fields are rendered in
    #[arg(long, value_enum, default_value = "english")]
    pub language: LanguageArg,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Number of concurrent provider calls for directories
    #[arg(short, long, default_value = "2")]
    pub parallel: usize,
}

/// Supported vision engines.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EngineArg {
    /// OpenAI vision models
    Openai,
    /// Google Gemini vision models
    Gemini,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Openai => Engine::OpenAi,
            EngineArg::Gemini => Engine::Gemini,
        }
    }
}

impl std::fmt::Display for EngineArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineArg::Openai => write!(f, "openai"),
            EngineArg::Gemini => write!(f, "gemini"),
        }
    }
}

/// Supported report languages.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LanguageArg {
    /// English report fields
    English,
    /// Persian (Farsi) report fields
    Persian,
}

impl From<LanguageArg> for ReportLanguage {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::English => ReportLanguage::English,
            LanguageArg::Persian => ReportLanguage::Persian,
        }
    }
}

impl std::fmt::Display for LanguageArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageArg::English => write!(f, "english"),
            LanguageArg::Persian => write!(f, "persian"),
        }
    }
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// One line of batch output: the file analyzed plus its report fields.
#[derive(serde::Serialize)]
struct BatchRecord {
    file: PathBuf,
    #[serde(flatten)]
    report: DamageReport,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    // Validate input path exists
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    let analyzer = Analyzer::new(&config)?;
    let engine = Engine::from(args.engine);
    let language = ReportLanguage::from(args.language);

    if args.input.is_file() {
        analyze_single(&analyzer, &args, engine, language).await
    } else {
        analyze_directory(&analyzer, &args, engine, language).await
    }
}

// ── Single-file analysis ───────────────────────────────────────────────────

/// Analyze one image and emit its report.
async fn analyze_single(
    analyzer: &Analyzer,
    args: &AnalyzeArgs,
    engine: Engine,
    language: ReportLanguage,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.input).await?;
    let report = analyzer.analyze_bytes(bytes, engine, language).await?;

    if let Some(ref output_path) = args.output {
        let file = File::create(output_path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), args.format.into(), true);
        writer.write(&report)?;
        writer.flush()?;
        tracing::info!("Report written to {:?}", output_path);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

// ── Batch analysis ─────────────────────────────────────────────────────────

/// Analyze a directory of images with progress tracking.
async fn analyze_directory(
    analyzer: &Analyzer,
    args: &AnalyzeArgs,
    engine: Engine,
    language: ReportLanguage,
) -> anyhow::Result<()> {
    let files = claimlens_core::intake::discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to analyze", files.len());

    let progress = create_progress_bar(files.len() as u64);
    let start_time = std::time::Instant::now();

    // Stream JSONL to stdout as reports complete; everything else is
    // collected through the channel and written after the batch.
    let stream_stdout = args.output.is_none() && matches!(args.format, OutputFormat::Jsonl);

    let (tx, rx) = std::sync::mpsc::channel::<BatchRecord>();
    let progress_cb = progress.clone();

    let (succeeded, failed) = analyzer
        .analyze_batch(&files, engine, language, args.parallel, move |result| {
            match result {
                BatchResult::Success { path, report } => {
                    let record = BatchRecord { file: path, report };
                    if stream_stdout {
                        if let Ok(json) = serde_json::to_string(&record) {
                            println!("{json}");
                        }
                    }
                    let _ = tx.send(record);
                }
                BatchResult::Failure { path, error } => {
                    tracing::error!("Failed: {:?} - {}", path, error);
                }
            }

            // Update progress bar with rate
            progress_cb.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let rate = progress_cb.position() as f64 / elapsed;
                progress_cb.set_message(format!("{:.1} img/sec", rate));
            }
        })
        .await;

    let records: Vec<BatchRecord> = rx.try_iter().collect();

    if let Some(ref output_path) = args.output {
        let file = File::create(output_path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), args.format.into(), false);
        writer.write_all(&records)?;
        writer.flush()?;
        tracing::info!("Output written to {:?}", output_path);
    } else if matches!(args.format, OutputFormat::Json) && !records.is_empty() {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    // Finish progress bar and show summary
    let elapsed = start_time.elapsed();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        succeeded as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    progress.finish_and_clear();
    print_summary(succeeded, failed, elapsed, rate);

    Ok(())
}

/// Create a progress bar for batch analysis.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch analysis.
fn print_summary(succeeded: usize, failed: usize, elapsed: std::time::Duration, rate: f64) {
    let total = succeeded + failed;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
