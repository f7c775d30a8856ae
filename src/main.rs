//! `specgram`: extract STFT spectrograms from WAV files as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use specgram::config::{self, Settings};
use specgram::logging;
use specgram::pipeline::Pipeline;
use specgram::{Padding, SpectrogramMode, WindowKind};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init(options.log_dir.as_deref()) {
        eprintln!("Logging disabled: {err}");
    }
    let settings = match &options.config {
        Some(path) => config::load_settings_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    let settings = options.apply(settings);
    let pipeline = Pipeline::new(settings).map_err(|err| err.to_string())?;
    let document = pipeline
        .process_files(&options.inputs)
        .map_err(|err| err.to_string())?;

    match &options.out {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &document)
                .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
            writer
                .flush()
                .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
            tracing::info!("Wrote spectrogram {:?} to {}", document.shape, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer(&mut writer, &document)
                .map_err(|err| format!("Failed to write output: {err}"))?;
            writeln!(writer).map_err(|err| format!("Failed to write output: {err}"))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    inputs: Vec<PathBuf>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    frame_length: Option<usize>,
    frame_step: Option<usize>,
    fft_length: Option<usize>,
    padding: Option<Padding>,
    mode: Option<SpectrogramMode>,
    window: Option<WindowKind>,
    sample_rate: Option<u32>,
    clip_seconds: Option<f32>,
    no_expand: bool,
    bandwidths: Vec<usize>,
}

impl CliOptions {
    /// Command-line values take precedence over the settings file.
    fn apply(&self, mut settings: Settings) -> Settings {
        let extractor = &mut settings.extractor;
        if let Some(value) = self.frame_length {
            extractor.frame_length = value;
        }
        if let Some(value) = self.frame_step {
            extractor.frame_step = value;
        }
        if let Some(value) = self.fft_length {
            extractor.fft_length = value;
        }
        if let Some(value) = self.padding {
            extractor.padding = value;
        }
        if let Some(value) = self.mode {
            extractor.mode = value;
        }
        if let Some(value) = self.window {
            extractor.window = value;
        }
        if self.no_expand {
            extractor.expand_dims = false;
        }
        if let Some(value) = self.sample_rate {
            settings.audio.sample_rate = value;
        }
        if self.clip_seconds.is_some() {
            settings.audio.clip_seconds = self.clip_seconds;
        }
        if !self.bandwidths.is_empty() {
            settings.extra_frame_lengths = self.bandwidths.clone();
        }
        settings
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        match arg {
            "-h" | "--help" => return Err(help_text()),
            "--config" => options.config = Some(PathBuf::from(value(&args, &mut idx, arg)?)),
            "--out" => options.out = Some(PathBuf::from(value(&args, &mut idx, arg)?)),
            "--log-dir" => options.log_dir = Some(PathBuf::from(value(&args, &mut idx, arg)?)),
            "--frame-length" => options.frame_length = Some(parsed(&args, &mut idx, arg)?),
            "--frame-step" => options.frame_step = Some(parsed(&args, &mut idx, arg)?),
            "--fft-length" => options.fft_length = Some(parsed(&args, &mut idx, arg)?),
            "--padding" => options.padding = Some(parsed(&args, &mut idx, arg)?),
            "--mode" => options.mode = Some(parsed(&args, &mut idx, arg)?),
            "--window" => options.window = Some(parsed(&args, &mut idx, arg)?),
            "--sample-rate" => options.sample_rate = Some(parsed(&args, &mut idx, arg)?),
            "--clip-seconds" => options.clip_seconds = Some(parsed(&args, &mut idx, arg)?),
            "--bandwidth" => options.bandwidths.push(parsed(&args, &mut idx, arg)?),
            "--no-expand" => options.no_expand = true,
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            input => options.inputs.push(PathBuf::from(input)),
        }
        idx += 1;
    }
    if options.inputs.is_empty() {
        return Err(help_text());
    }
    Ok(options)
}

fn value<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parsed<T>(args: &[String], idx: &mut usize, flag: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value(args, idx, flag)?;
    raw.parse::<T>()
        .map_err(|err| format!("Invalid {flag} value {raw}: {err}"))
}

fn help_text() -> String {
    [
        "specgram",
        "",
        "Extracts STFT spectrograms from WAV files and writes them as JSON.",
        "",
        "Usage:",
        "  specgram [options] <input.wav>...",
        "",
        "Options:",
        "  --config <file>        Settings file (default: specgram.toml in the app directory)",
        "  --out <file>           Write JSON here instead of stdout",
        "  --frame-length <n>     Samples per frame",
        "  --frame-step <n>       Samples between frames",
        "  --fft-length <n>       DFT length (>= frame length)",
        "  --padding <p>          valid | same",
        "  --mode <m>             magnitude | log | power | log_power | complex",
        "  --window <w>           hann | hann_symmetric | hamming | rectangular",
        "  --sample-rate <hz>     Resample inputs to this rate",
        "  --clip-seconds <s>     Pad or truncate inputs to this length",
        "  --bandwidth <n>        Extra frame length stacked as a channel (repeatable)",
        "  --no-expand            Omit the trailing channel axis",
        "  --log-dir <dir>        Directory for log files",
    ]
    .join("\n")
}
