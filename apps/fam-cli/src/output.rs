use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use fam_core::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Writes a `0xAABBGGRR` frame as an RGBA PNG.
pub fn write_png(path: &Path, screen: &[u32]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().context("writing PNG header")?;

    let rgba: Vec<u8> = screen.iter().flat_map(|px| px.to_le_bytes()).collect();
    writer
        .write_image_data(&rgba)
        .context("writing PNG data")?;
    writer.finish().context("finishing PNG")?;
    Ok(())
}

/// Raw PCM sink.
pub struct PcmDump {
    out: BufWriter<File>,
    samples: usize,
}

impl PcmDump {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            samples: 0,
        })
    }

    pub fn push(&mut self, samples: &[u8]) -> Result<()> {
        self.out.write_all(samples).context("writing PCM")?;
        self.samples += samples.len();
        Ok(())
    }

    /// Flushes and returns the number of samples written.
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush().context("flushing PCM")?;
        Ok(self.samples)
    }
}
