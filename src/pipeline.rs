//! # Label Pipeline
//!
//! Runs one request from items to printed copies:
//!
//! ```text
//!  LabelRequest
//!      │  encode each item            (failures skip the item)
//!      ▼
//!  [EncodedItem]  text │ bitmap │ skipped
//!      │  caption QR bitmaps
//!      ▼
//!  LabelCompositor ──► output/label.png
//!      │
//!      ▼
//!  Rasterizer ──► RasterJob ──► Printer × qty
//! ```
//!
//! The pipeline owns the font and encoder settings; build it once and reuse
//! it for every request.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::encode::{BarcodeEncoder, ChunkedQrEncoder, EncodeError, QrEncoder};
use crate::error::LabelError;
use crate::printer::{PrintReport, Printer};
use crate::protocol::{RasterJob, Rasterizer};
use crate::render::caption::with_caption;
use crate::render::compose::{Block, Composition, LabelCompositor};
use crate::render::font::LabelFont;
use crate::request::{LabelItem, LabelKind, LabelRequest, Quantity};
use crate::transport::RasterSink;

/// What encoding produced for one item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Drawn by the compositor from the item's key and value
    Text,
    Bitmap(GrayImage),
    Skipped(LabelError),
}

#[derive(Debug)]
pub struct EncodedItem {
    pub item: LabelItem,
    pub outcome: ItemOutcome,
}

impl EncodedItem {
    fn block(&self) -> Option<Block<'_>> {
        match (&self.outcome, self.item.kind) {
            (ItemOutcome::Text, _) => Some(Block::Text {
                key: &self.item.key,
                value: &self.item.value,
            }),
            (ItemOutcome::Bitmap(img), LabelKind::Barcode) => Some(Block::Barcode(img)),
            (ItemOutcome::Bitmap(img), _) => Some(Block::Qr(img)),
            (ItemOutcome::Skipped(_), _) => None,
        }
    }
}

/// A composed label and how each item fared.
#[derive(Debug)]
pub struct RenderedLabel {
    pub quantity: Quantity,
    pub items: Vec<EncodedItem>,
    pub composition: Composition,
}

impl RenderedLabel {
    pub fn image(&self) -> &GrayImage {
        &self.composition.image
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&LabelItem, &LabelError)> {
        self.items.iter().filter_map(|e| match &e.outcome {
            ItemOutcome::Skipped(err) => Some((&e.item, err)),
            _ => None,
        })
    }
}

/// Result of a processed request.
#[derive(Debug)]
pub struct PrintOutcome {
    pub label_path: PathBuf,
    pub rendered: RenderedLabel,
    pub report: PrintReport,
}

/// Owned handle holding the font and every encoder.
#[derive(Debug)]
pub struct LabelPipeline {
    config: PipelineConfig,
    font: LabelFont,
    barcode: BarcodeEncoder,
    qr: QrEncoder,
    chunked: ChunkedQrEncoder,
    compositor: LabelCompositor,
    rasterizer: Rasterizer,
}

impl LabelPipeline {
    /// Build a pipeline, loading the configured font or the built-in one.
    pub fn new(config: PipelineConfig) -> Self {
        let font = LabelFont::load_or_builtin(config.font_path());
        Self::with_font(config, font)
    }

    pub fn with_font(config: PipelineConfig, font: LabelFont) -> Self {
        let qr = QrEncoder::new(config.qr);
        Self {
            font,
            barcode: config.barcode.clone(),
            chunked: ChunkedQrEncoder::new(config.split_threshold, qr.clone()),
            qr,
            compositor: LabelCompositor::new(config.compositor),
            rasterizer: Rasterizer::new(config.printer, config.raster),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn font(&self) -> &LabelFont {
        &self.font
    }

    /// Encode a single item. Never fails; problems become [`ItemOutcome::Skipped`].
    pub fn encode_item(&self, item: &LabelItem) -> ItemOutcome {
        let encoded: Result<GrayImage, EncodeError> = match item.kind {
            LabelKind::Text => return ItemOutcome::Text,
            LabelKind::Barcode => self.barcode.encode(&item.value, &self.font),
            LabelKind::Qr => self.qr.encode(&item.value),
            LabelKind::QrChunked => self.chunked.encode(&item.value),
        };

        match encoded {
            Ok(img) => {
                let img = match (item.kind, self.config.caption()) {
                    (LabelKind::Qr | LabelKind::QrChunked, Some(caption)) => {
                        with_caption(img, caption, &self.font)
                    }
                    _ => img,
                };
                ItemOutcome::Bitmap(img)
            }
            Err(e) => {
                let err = LabelError::Encode {
                    kind: item.kind,
                    key: item.key.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(kind = %item.kind, key = %item.key, error = %e, "skipping item");
                ItemOutcome::Skipped(err)
            }
        }
    }

    /// Encode every item, keeping request order.
    pub fn encode(&self, request: &LabelRequest) -> Vec<EncodedItem> {
        request
            .items
            .iter()
            .map(|item| EncodedItem {
                item: item.clone(),
                outcome: self.encode_item(item),
            })
            .collect()
    }

    /// Encode and compose a request into one label image.
    pub fn render(&self, request: &LabelRequest) -> Result<RenderedLabel, LabelError> {
        let items = self.encode(request);
        let blocks: Vec<Block<'_>> = items.iter().filter_map(EncodedItem::block).collect();
        let composition = self.compositor.compose(&blocks, &self.font)?;

        let rendered = RenderedLabel {
            quantity: request.quantity,
            items,
            composition,
        };
        if self.config.save_intermediates {
            self.save_intermediates(&rendered)?;
        }
        Ok(rendered)
    }

    /// Write `image` to the well-known output path.
    ///
    /// The PNG is written to a unique temporary file first and renamed into
    /// place, so readers never see a half-written label.
    pub fn save_label(&self, image: &GrayImage) -> Result<PathBuf, LabelError> {
        let dir = self.config.output_dir();
        fs::create_dir_all(&dir)?;
        let target = self.config.output_path();
        let tmp = dir.join(format!(".label-{}.png.tmp", Uuid::new_v4()));

        if let Err(e) = image.save_with_format(&tmp, ImageFormat::Png) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        fs::rename(&tmp, &target)?;

        tracing::info!(path = %target.display(), "label written");
        Ok(target)
    }

    fn save_intermediates(&self, rendered: &RenderedLabel) -> Result<PathBuf, LabelError> {
        let dir = self.config.requests_dir().join(Uuid::new_v4().to_string());
        fs::create_dir_all(&dir)?;
        for (index, encoded) in rendered.items.iter().enumerate() {
            if let ItemOutcome::Bitmap(img) = &encoded.outcome {
                let name = format!("item-{:02}-{}.png", index, encoded.item.kind.wire_name());
                save_png(img, &dir.join(name))?;
            }
        }
        save_png(rendered.image(), &dir.join("label.png"))?;
        tracing::debug!(dir = %dir.display(), "intermediates saved");
        Ok(dir)
    }

    /// Convert a composed label into a raster job for `device`.
    pub fn rasterize(&self, label: &GrayImage, device: &str) -> Result<RasterJob, LabelError> {
        self.rasterizer.rasterize(label, device)
    }

    /// Render, save, rasterize and print `request.quantity` copies.
    pub fn process<S: RasterSink>(
        &self,
        request: &LabelRequest,
        printer: &Printer<S>,
    ) -> Result<PrintOutcome, LabelError> {
        let rendered = self.render(request)?;
        let label_path = self.save_label(rendered.image())?;
        let job = self.rasterize(rendered.image(), &printer.describe())?;
        let report = printer.print(&job, rendered.quantity);

        Ok(PrintOutcome {
            label_path,
            rendered,
            report,
        })
    }

    /// [`process`](Self::process) for a raw request document.
    pub fn process_json<S: RasterSink>(
        &self,
        raw: &str,
        printer: &Printer<S>,
    ) -> Result<PrintOutcome, LabelError> {
        let request = LabelRequest::from_json(raw)?;
        self.process(&request, printer)
    }
}

fn save_png(image: &GrayImage, path: &Path) -> Result<(), LabelError> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
