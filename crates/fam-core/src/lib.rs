use tracing::{debug, info, warn};

use crate::{
    apu::{Apu, FRAME_SAMPLES},
    bus::{
        MemoryMap,
        cpu::{CpuBus, IoPorts, peek},
    },
    cartridge::{
        Cartridge, MapperRegistry, load_cartridge, load_cartridge_as, load_cartridge_from_file,
    },
    cpu::Cpu,
    error::Error,
    memory::cpu::PRG_RAM_SIZE,
    ppu::{Ppu, SCANLINES_PER_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH, VBLANK_LINE},
    ram::Wram,
    request::{Command, InitParam, Request, Response, StorageRequest},
    reset_kind::ResetKind,
    save::FlushPolicy,
};

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod ram;
pub mod request;
pub mod reset_kind;
pub mod save;

pub use cpu::CpuSnapshot;

/// Scanlines at which the APU renders one slice of audio.
pub const APU_STEP_LINES: [u16; 4] = [0, 66, 131, 197];
/// Consecutive skip-frame requests honoured before further ones are dropped.
pub const MAX_SKIP_FRAMES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Next frame loads the cartridge and powers everything on.
    PowerOn,
    /// Next frame presses the reset button.
    Reset,
    /// Waiting for the host to answer a save-RAM load.
    AwaitStorage,
    Running,
    /// Shut down; every request is answered with an empty response.
    Halted,
}

/// The console: owns every component and advances them one frame per request.
#[derive(Debug)]
pub struct Famicom {
    cpu: Cpu,
    ppu: Ppu,
    apu: Apu,
    wram: Wram,
    io: IoPorts,
    map: MemoryMap,
    cartridge: Option<Cartridge>,
    registry: MapperRegistry,
    param: Option<InitParam>,
    phase: Phase,
    skipped: u32,
    flush: FlushPolicy,
}

impl Default for Famicom {
    fn default() -> Self {
        Self::new()
    }
}

impl Famicom {
    /// Constructs a console with the built-in boards and no cartridge.
    pub fn new() -> Self {
        Self::with_registry(MapperRegistry::default())
    }

    /// Constructs a console whose boards come from `registry`.
    pub fn with_registry(registry: MapperRegistry) -> Self {
        Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            wram: Wram::new(),
            io: IoPorts::new(),
            map: MemoryMap::console(),
            cartridge: None,
            registry,
            param: None,
            phase: Phase::PowerOn,
            skipped: 0,
            flush: FlushPolicy::default(),
        }
    }

    pub fn registry_mut(&mut self) -> &mut MapperRegistry {
        &mut self.registry
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    pub fn cpu_snapshot(&self) -> CpuSnapshot {
        self.cpu.snapshot()
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Handles one host request.
    ///
    /// Only cartridge loading can fail; the console keeps its previous state
    /// and the same request may be retried after fixing the parameter.
    pub fn execute(&mut self, request: Request) -> Result<Response, Error> {
        if self.phase == Phase::Halted {
            return Ok(Response::default());
        }

        match request.command {
            Command::SetParameter(param) => {
                if let InitParam::Path(path) = &param {
                    debug!(path = %path.display(), "cartridge parameter set");
                } else {
                    debug!("cartridge parameter set");
                }
                self.param = Some(param);
                self.phase = Phase::PowerOn;
                Ok(Response::default())
            }
            Command::Reset => {
                if self.phase == Phase::Running {
                    self.phase = Phase::Reset;
                }
                Ok(Response::default())
            }
            Command::Shutdown => {
                let mut response = Response::default();
                // A cartridge still waiting for its stored image has nothing to save.
                if self.phase != Phase::AwaitStorage {
                    response.storage.extend(self.save_request());
                }
                info!("shutting down");
                self.phase = Phase::Halted;
                Ok(response)
            }
            Command::StorageResponse(data) => {
                self.load_save_ram(&data);
                Ok(Response::default())
            }
            Command::Frame => self.frame(request.buttons, true),
            Command::SkipFrame => self.frame(request.buttons, false),
        }
    }

    fn frame(&mut self, buttons: [u8; 2], render: bool) -> Result<Response, Error> {
        let mut response = Response::default();
        match self.phase {
            Phase::PowerOn => {
                self.power_on()?;
                if let Some(load) = self.load_request() {
                    response.storage.push(load);
                    self.phase = Phase::AwaitStorage;
                    return Ok(response);
                }
                self.phase = Phase::Running;
            }
            Phase::Reset => {
                self.soft_reset();
                self.phase = Phase::Running;
            }
            Phase::AwaitStorage => return Ok(response),
            Phase::Running | Phase::Halted => {}
        }

        if render {
            self.skipped = 0;
        } else if self.skipped >= MAX_SKIP_FRAMES {
            debug!(skipped = self.skipped, "dropping skip-frame request");
            return Ok(response);
        } else {
            self.skipped += 1;
        }

        for (pad, mask) in self.io.pads.iter_mut().zip(buttons) {
            pad.set_buttons(mask);
        }

        let (screen, sound) = self.run_frame(render);
        response.screen = screen;
        response.sound = Some(sound);

        let counter = self
            .cartridge
            .as_ref()
            .filter(|cartridge| cartridge.is_battery_backed())
            .map(|cartridge| cartridge.save_ram().dirty_counter());
        if counter.is_some_and(|counter| self.flush.end_frame(counter)) {
            response.storage.extend(self.save_request());
        }
        Ok(response)
    }

    fn power_on(&mut self) -> Result<(), Error> {
        let param = self.param.as_ref().ok_or(Error::NoCartridge)?;
        let mut cartridge = match param {
            InitParam::Path(path) => load_cartridge_from_file(path, &self.registry)?,
            InitParam::Rom(bytes) => load_cartridge(bytes, &self.registry)?,
            InitParam::Registry { id, rom } => load_cartridge_as(rom, &self.registry, *id)?,
        };
        info!(
            mapper = cartridge.board().mapper_id(),
            board = %cartridge.board().name(),
            key = cartridge.rom().key(),
            "power on"
        );

        self.map = MemoryMap::console();
        self.wram.clear();
        self.io = IoPorts::new();
        self.ppu.reset(ResetKind::PowerOn);
        self.apu.reset(ResetKind::PowerOn);
        self.skipped = 0;
        cartridge.init(&mut self.map, &mut self.ppu, ResetKind::PowerOn);
        self.flush = FlushPolicy::new(cartridge.save_ram().dirty_counter());

        let cartridge = self.cartridge.insert(cartridge);
        let mut bus = CpuBus::new(
            &mut self.map,
            &mut self.wram,
            &mut self.ppu,
            &mut self.apu,
            &mut self.io,
            cartridge,
        );
        self.cpu.reset(&mut bus, ResetKind::PowerOn);
        Ok(())
    }

    fn soft_reset(&mut self) {
        let Some(cartridge) = self.cartridge.as_mut() else {
            return;
        };
        info!("reset");
        cartridge.init(&mut self.map, &mut self.ppu, ResetKind::Soft);
        self.ppu.reset(ResetKind::Soft);
        self.apu.reset(ResetKind::Soft);
        self.skipped = 0;
        let mut bus = CpuBus::new(
            &mut self.map,
            &mut self.wram,
            &mut self.ppu,
            &mut self.apu,
            &mut self.io,
            cartridge,
        );
        self.cpu.reset(&mut bus, ResetKind::Soft);
    }

    fn load_request(&self) -> Option<StorageRequest> {
        let cartridge = self.cartridge.as_ref()?;
        cartridge.is_battery_backed().then(|| StorageRequest::Load {
            key: cartridge.rom().key().to_owned(),
            size: PRG_RAM_SIZE,
        })
    }

    fn save_request(&mut self) -> Option<StorageRequest> {
        let cartridge = self.cartridge.as_ref()?;
        if !cartridge.is_battery_backed() {
            return None;
        }
        let save = cartridge.save_ram();
        self.flush.mark_flushed(save.dirty_counter());
        Some(StorageRequest::Save {
            key: cartridge.rom().key().to_owned(),
            data: save.bytes().to_vec(),
        })
    }

    fn load_save_ram(&mut self, data: &[u8]) {
        if self.phase != Phase::AwaitStorage {
            warn!(len = data.len(), "unexpected storage response ignored");
            return;
        }
        if let Some(cartridge) = self.cartridge.as_mut() {
            debug!(len = data.len(), "save RAM loaded");
            let save = cartridge.save_ram_mut();
            save.load(data);
            self.flush = FlushPolicy::new(save.dirty_counter());
        }
        self.phase = Phase::Running;
    }

    /// Runs 262 scanlines. Returns the picture when `render` is set and the
    /// frame's PCM.
    fn run_frame(&mut self, render: bool) -> (Option<Box<[u32]>>, Box<[u8]>) {
        let mut screen = render.then(|| vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice());
        let mut sound = Vec::with_capacity(FRAME_SAMPLES);

        let Self {
            cpu,
            ppu,
            apu,
            wram,
            io,
            map,
            cartridge,
            ..
        } = self;
        let Some(cartridge) = cartridge.as_mut() else {
            return (screen, sound.into_boxed_slice());
        };

        for line in 0..SCANLINES_PER_FRAME {
            if line == VBLANK_LINE {
                cartridge.vblank(map, ppu);
            }
            ppu.pre_render(line);
            cartridge.pre_scanline(map, ppu, line);
            ppu.render_scanline(line, screen.as_deref_mut());
            cartridge.hblank(map, ppu, line);

            {
                let mut bus = CpuBus::new(map, wram, ppu, apu, io, cartridge);
                cpu.execute(&mut bus, line);
            }

            if APU_STEP_LINES.contains(&line) {
                let (map, wram, cart) = (&*map, &*wram, &*cartridge);
                let slice = apu.step_frame(&mut |addr| peek(map, wram, cart, addr));
                sound.extend_from_slice(&slice);
            }
        }

        (screen, sound.into_boxed_slice())
    }
}
