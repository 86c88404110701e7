//! # labelprint CLI
//!
//! Command-line interface for rendering and printing labels on Brother QL
//! printers.
//!
//! ## Usage
//!
//! ```bash
//! # Print a label request (argument, file via @path, or stdin)
//! labelprint print '{"qty": 2, "labelItems": [{"labelType": "QR", "labelValue": "ABC123"}]}'
//!
//! # Package documents are accepted too
//! labelprint print @package.json
//!
//! # Render without printing
//! labelprint preview --png label.png @request.json
//!
//! # Dump the raster stream instead of printing
//! labelprint print --device file:///tmp/job.bin @request.json
//!
//! # Show the label request built from a package document
//! labelprint package @package.json
//!
//! # GS1 element string
//! labelprint gs1 --product 7612345000011 --lot "L5 2024" --expiry 2025-03-01
//!
//! # Supported printers and tapes
//! labelprint models
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 2 | malformed input document |
//! | 3 | processing or printing failure, including any failed copy |

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use labelprint::{
    LabelError, LabelPipeline, PipelineConfig, PrinterConfig,
    encode::Gs1CodeBuilder,
    package::{self, parse_expiry},
    printer::{PrinterModel, Printer, TapeSpec},
    render::dither::{DEFAULT_THRESHOLD, DitheringAlgorithm},
    transport::{DeviceAddress, DeviceSink, FileSink, RasterSink},
};

/// labelprint - Label rendering and printing for Brother QL printers
#[derive(Parser, Debug)]
#[command(name = "labelprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a request and print it
    Print {
        /// Request or package JSON, `@FILE`, or `-` for stdin
        payload: Option<String>,

        /// Printer address: usb://0xVVVV:0xPPPP, file:///path or a device path
        #[arg(long, env = "PRINTER_IDENTIFIER", default_value = "usb://0x04f9:0x2042")]
        device: String,

        /// Delay between copies in milliseconds
        #[arg(long, env = "LABEL_PACING_MS", default_value = "400")]
        pacing_ms: u64,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render a request to PNG without printing
    Preview {
        /// Request or package JSON, `@FILE`, or `-` for stdin
        payload: Option<String>,

        /// Also write the label to this file
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Write the raster stream for one copy to this file
        #[arg(long, value_name = "FILE")]
        raster: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Convert a package document into a label request
    Package {
        /// Package JSON, `@FILE`, or `-` for stdin
        payload: Option<String>,
    },

    /// Print a GS1 element string
    Gs1 {
        /// Product code (digits are used as the GTIN)
        #[arg(long, default_value = "")]
        product: String,

        /// Lot or batch number
        #[arg(long, default_value = "")]
        lot: String,

        /// Expiry date (defaults to three years from now)
        #[arg(long)]
        expiry: Option<String>,
    },

    /// List supported printer models and tapes
    Models,
}

/// Options shared by commands that render labels.
#[derive(Args, Debug)]
struct RenderArgs {
    /// Printer model
    #[arg(long, env = "PRINTER_MODEL", default_value = "QL-700")]
    model: String,

    /// Endless tape width in mm
    #[arg(long, env = "PRINTER_TAPE", default_value = "62")]
    tape: String,

    /// Caption under QR codes (empty to disable)
    #[arg(long, env = "QR_OVERLAY_TEXT", default_value = "Digital Hospitals")]
    qr_caption: String,

    /// Directory holding fonts/, output/ and requests/
    #[arg(long, env = "LABEL_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// TrueType font file
    #[arg(long, env = "LABEL_FONT")]
    font: Option<PathBuf>,

    /// Threshold instead of dithering
    #[arg(long, env = "LABEL_NO_DITHER")]
    no_dither: bool,

    /// Do not cut after each label
    #[arg(long)]
    no_cut: bool,

    /// Keep per-item bitmaps under requests/<uuid>/
    #[arg(long)]
    save_intermediates: bool,
}

impl RenderArgs {
    fn pipeline_config(&self) -> Result<PipelineConfig, LabelError> {
        let printer = PrinterConfig::parse(&self.model, &self.tape)?;
        let mut config = PipelineConfig::for_printer(printer);
        config.work_dir = self.work_dir.clone();
        config.font_path = self.font.clone();
        config.qr_caption = Some(self.qr_caption.clone());
        config.save_intermediates = self.save_intermediates;
        config.raster.cut = !self.no_cut;
        if self.no_dither {
            config.raster.dithering = DitheringAlgorithm::Threshold(DEFAULT_THRESHOLD);
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "label job failed");
            eprintln!("Error: {}", e);
            if e.is_fatal() {
                ExitCode::from(2)
            } else {
                ExitCode::from(3)
            }
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, LabelError> {
    match cli.command {
        Commands::Print {
            payload,
            device,
            pacing_ms,
            render,
        } => {
            let raw = read_payload(payload.as_deref())?;
            let request = package::request_from_json(&raw, Utc::now())?;

            let mut config = render.pipeline_config()?;
            config.pacing = Duration::from_millis(pacing_ms);
            let pipeline = LabelPipeline::new(config);

            let address = DeviceAddress::parse(&device)?;
            let printer = Printer::new(DeviceSink::new(address)).with_pacing(pipeline.config().pacing);
            let outcome = pipeline.process(&request, &printer)?;

            for (item, err) in outcome.rendered.skipped() {
                eprintln!("Skipped {} item '{}': {}", item.kind, item.key, err);
            }
            println!("Label written to {}", outcome.label_path.display());

            let report = &outcome.report;
            for copy in &report.outcomes {
                if let Err(e) = &copy.result {
                    eprintln!("Copy {}: {}", copy.copy, e);
                }
            }
            if report.is_success() {
                println!("Printed {} cop{} on {}", report.succeeded(), plural(report.succeeded()), report.device);
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!(
                    "{} of {} copies failed on {}",
                    report.failed(),
                    report.requested,
                    report.device
                );
                Ok(ExitCode::from(3))
            }
        }

        Commands::Preview {
            payload,
            png,
            raster,
            render,
        } => {
            let raw = read_payload(payload.as_deref())?;
            let request = package::request_from_json(&raw, Utc::now())?;
            let pipeline = LabelPipeline::new(render.pipeline_config()?);

            let rendered = pipeline.render(&request)?;
            let path = pipeline.save_label(rendered.image())?;
            println!(
                "Label written to {} ({}x{})",
                path.display(),
                rendered.composition.width(),
                rendered.composition.height()
            );
            if let Some(png) = png {
                rendered.image().save(&png)?;
                println!("Label written to {}", png.display());
            }
            if let Some(raster) = raster {
                let mut sink = FileSink::create(&raster)?;
                let job = pipeline.rasterize(rendered.image(), &sink.describe())?;
                sink.send(&job.instructions)?;
                println!("Raster job ({} lines) written to {}", job.raster_lines, raster.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Package { payload } => {
            let raw = read_payload(payload.as_deref())?;
            let request = package::request_from_json(&raw, Utc::now())?;
            println!("{}", request.to_json()?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Gs1 {
            product,
            lot,
            expiry,
        } => {
            let now = Utc::now();
            let expiry = match expiry {
                Some(raw) => parse_expiry(&Value::String(raw.clone()))
                    .ok_or_else(|| LabelError::InvalidPayload(format!("unrecognized expiry '{}'", raw)))?,
                None => package::PackageLabel::default().expiry_date(now),
            };
            println!("{}", Gs1CodeBuilder::new().build(&product, &lot, expiry));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Models => {
            println!("Printer models:");
            for model in PrinterModel::ALL {
                println!(
                    "  {:<10} {:>4} dots{}{}",
                    model.name,
                    model.head_width(),
                    if model.compression { "  compression" } else { "" },
                    if model.cutting { "  cutter" } else { "" },
                );
            }
            println!("\nEndless tapes:");
            for tape in TapeSpec::ALL {
                println!(
                    "  {:<4} {:>4} dots printable{}",
                    tape.name,
                    tape.dots_printable,
                    if tape.wide_only { "  (wide models only)" } else { "" }
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Read the payload argument: inline JSON, `@FILE`, or stdin.
fn read_payload(arg: Option<&str>) -> Result<String, LabelError> {
    match arg {
        Some(path) if path.starts_with('@') => Ok(std::fs::read_to_string(&path[1..])?),
        Some(inline) if inline != "-" => Ok(inline.to_string()),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}
