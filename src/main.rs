use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use pagexml_lines::config;
use pagexml_lines::config::settings::Settings;
use pagexml_lines::diagnostics::TracingSink;
use pagexml_lines::error::LineCutError;
use pagexml_lines::layout::Page;
use pagexml_lines::paths::is_plain_file_name;
use pagexml_lines::pipeline::{CutLine, PagePair, cut_page, load_page};
use pagexml_lines::writeback::{FsPageStore, WriteBackTracker};

const USAGE: &str = "Usage: pagexml_lines [--settings <settings.yaml>] [--predictions <predictions.tsv>] <image>...";

struct CliArgs {
    settings: Option<PathBuf>,
    predictions: Option<PathBuf>,
    images: Vec<PathBuf>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    id: String,
    image: Option<String>,
    text: Option<&'a str>,
    region_type: &'a str,
    width: u32,
    height: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        eprintln!("  Cut text lines out of page images using their PAGE XML layout.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pagexml_lines {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("ERROR: {msg}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let settings = match config::load_settings(cli.settings.as_deref(), &cli.images[0]) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &settings) {
        Ok(count) => {
            eprintln!("OK: {count} lines from {} pages", cli.images.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut settings = None;
    let mut predictions = None;
    let mut images = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--settings" => {
                let value = iter.next().ok_or("--settings needs a file")?;
                settings = Some(PathBuf::from(value));
            }
            "--predictions" => {
                let value = iter.next().ok_or("--predictions needs a file")?;
                predictions = Some(PathBuf::from(value));
            }
            other if other.starts_with("--") => return Err(format!("Unknown option '{other}'")),
            image => images.push(PathBuf::from(image)),
        }
    }

    if images.is_empty() {
        return Err("No input images given".to_string());
    }
    Ok(CliArgs {
        settings,
        predictions,
        images,
    })
}

fn run(cli: &CliArgs, settings: &Settings) -> pagexml_lines::error::Result<usize> {
    let output_dir = settings
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("lines"));
    std::fs::create_dir_all(&output_dir)?;

    let mut sink = TracingSink;
    let mut pages: Vec<Page> = Vec::new();
    let mut manifest = std::io::BufWriter::new(std::fs::File::create(output_dir.join("manifest.jsonl"))?);
    let mut line_count = 0;

    for image_path in &cli.images {
        let pair = PagePair::for_image(image_path, &settings.gt_extension);
        let Some(loaded) = load_page(&pair, settings, &mut sink)? else {
            continue;
        };
        let (page, lines) = cut_page(loaded, settings);

        let page_dir = output_dir.join(page_stem(page.id()));
        std::fs::create_dir_all(&page_dir)?;
        for line in &lines {
            let entry = write_line(&page_dir, line)?;
            serde_json::to_writer(&mut manifest, &entry)?;
            manifest.write_all(b"\n")?;
        }
        line_count += lines.len();
        pages.push(page);
    }
    manifest.flush()?;

    if let Some(predictions) = &cli.predictions {
        let mut store = FsPageStore::new(settings.pred_extension.clone());
        if let Some(dir) = &settings.output_dir {
            store = store.with_output_dir(dir);
        }
        let mut tracker = WriteBackTracker::new(settings.text_index, store);
        for page in pages {
            tracker.add_page(page);
        }

        let content = std::fs::read_to_string(predictions)?;
        for row in content.lines().filter(|l| !l.trim().is_empty()) {
            let (sample_id, text) = row.split_once('\t').unwrap_or((row, ""));
            tracker.store_sample_prediction(sample_id, text)?;
        }
        tracker.finish()?;
    }

    Ok(line_count)
}

fn write_line<'a>(page_dir: &Path, line: &'a CutLine) -> pagexml_lines::error::Result<ManifestEntry<'a>> {
    let sample = &line.sample;
    if !is_plain_file_name(&sample.line_id) {
        return Err(LineCutError::layout(format!(
            "Line id '{}' on page '{}' cannot be used as a file name",
            sample.line_id, sample.page_id
        )));
    }

    let mut entry = ManifestEntry {
        id: sample.sample_id(),
        image: None,
        text: sample.text.as_deref(),
        region_type: &sample.region_type,
        width: 0,
        height: 0,
    };

    if let Some(text) = &sample.text {
        std::fs::write(page_dir.join(format!("{}.gt.txt", sample.line_id)), text)?;
    }

    match &line.image {
        Some(image) if image.width() > 0 && image.height() > 0 => {
            let path = page_dir.join(format!("{}.png", sample.line_id));
            image.save(&path)?;
            entry.image = Some(path.display().to_string());
            entry.width = image.width();
            entry.height = image.height();
        }
        Some(_) => tracing::warn!(id = %entry.id, "empty line region, no image written"),
        None => {}
    }
    Ok(entry)
}

fn page_stem(page_id: &str) -> String {
    Path::new(page_id)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| page_id.to_string())
}
