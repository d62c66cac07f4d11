use std::{fs, time::Instant};

use anyhow::{Context, Result};
use fam_core::request::{InitParam, Response};
use fam_runtime::{FramePacer, Runtime, RuntimeConfig, RuntimeHandle};
use tracing::{debug, info};

use crate::{
    args::Args,
    output::{PcmDump, write_png},
};

pub struct App {
    args: Args,
    runtime: Runtime,
    pcm: Option<PcmDump>,
    last_screen: Option<Box<[u32]>>,
    drawn: u32,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = RuntimeConfig {
            storage_dir: args.save_dir.clone(),
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::start(config).context("Failed to start runtime")?;

        let param = match args.mapper {
            Some(id) => InitParam::Registry {
                id,
                rom: fs::read(&args.rom)
                    .with_context(|| format!("reading {}", args.rom.display()))?,
            },
            None => InitParam::Path(args.rom.clone()),
        };
        runtime
            .handle()
            .set_parameter(param)
            .context("Failed to select ROM")?;

        let pcm = args.pcm.as_deref().map(PcmDump::create).transpose()?;

        Ok(Self {
            args,
            runtime,
            pcm,
            last_screen: None,
            drawn: 0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let handle = self.runtime.handle();
        let buttons = [self.args.buttons, 0];
        let mut pacer = self.args.realtime.then(FramePacer::default);
        let started = Instant::now();

        for frame in 0..self.args.frames {
            let response = match pacer.as_mut() {
                Some(pacer) => handle.paced_frame(pacer, buttons),
                None => handle.frame(buttons),
            }
            .with_context(|| format!("frame {frame}"))?;
            self.consume(response)?;
        }

        self.finish(&handle)?;
        info!(
            frames = self.args.frames,
            drawn = self.drawn,
            elapsed = ?started.elapsed(),
            "run complete"
        );
        Ok(())
    }

    fn consume(&mut self, response: Response) -> Result<()> {
        if let (Some(pcm), Some(sound)) = (self.pcm.as_mut(), response.sound.as_deref()) {
            pcm.push(sound)?;
        }
        if let Some(screen) = response.screen {
            self.drawn += 1;
            self.last_screen = Some(screen);
        }
        Ok(())
    }

    fn finish(&mut self, handle: &RuntimeHandle) -> Result<()> {
        handle.shutdown().context("Failed to shut down runtime")?;

        if let Some(pcm) = self.pcm.take() {
            let samples = pcm.finish()?;
            debug!(samples, "PCM dump written");
        }

        if let Some(path) = &self.args.screenshot {
            let screen = self
                .last_screen
                .as_deref()
                .context("no frame was drawn")?;
            write_png(path, screen)?;
            info!(path = %path.display(), "screenshot written");
        }
        Ok(())
    }
}
