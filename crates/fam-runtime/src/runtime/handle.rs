use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use fam_core::{
    Famicom,
    request::{Command, InitParam, Request, Response},
};
use tracing::info;

use crate::storage::{FileStorage, MemoryStorage, Storage};

use super::{
    control::{ControlMessage, ControlReplySender},
    pacer::FramePacer,
    runner::Runner,
    types::{RuntimeConfig, RuntimeError},
};

struct RuntimeInner {
    ctrl_tx: Sender<ControlMessage>,
    reply_timeout: Duration,
}

/// Owns the worker thread hosting a [`Famicom`]. Dropping it flushes save
/// RAM and stops the worker.
pub struct Runtime {
    inner: Arc<RuntimeInner>,
    join: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Starts a worker with storage chosen by `config`.
    pub fn start(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let storage: Box<dyn Storage> = match &config.storage_dir {
            Some(dir) => Box::new(FileStorage::new(dir)),
            None => Box::new(MemoryStorage::new()),
        };
        Self::start_with(config, Famicom::new(), storage)
    }

    /// Starts a worker around a prepared console, e.g. one with extra boards
    /// registered.
    pub fn start_with(
        config: RuntimeConfig,
        famicom: Famicom,
        storage: Box<dyn Storage>,
    ) -> Result<Self, RuntimeError> {
        // One request in flight at a time.
        let (ctrl_tx, ctrl_rx) = bounded::<ControlMessage>(1);

        let join = thread::Builder::new()
            .name("fam-runtime".to_owned())
            .spawn(move || {
                let mut runner = Runner::new(famicom, storage, ctrl_rx);
                runner.run();
            })
            .map_err(RuntimeError::Spawn)?;
        info!(storage_dir = ?config.storage_dir, "runtime started");

        let inner = Arc::new(RuntimeInner {
            ctrl_tx,
            reply_timeout: config.reply_timeout,
        });

        Ok(Self {
            inner,
            join: Some(join),
        })
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let _ = self.inner.ctrl_tx.send(ControlMessage::Stop);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl RuntimeHandle {
    fn send_with_reply(
        &self,
        op: &'static str,
        build: impl FnOnce(ControlReplySender) -> ControlMessage,
    ) -> Result<Response, RuntimeError> {
        let (reply_tx, reply_rx) = bounded::<Result<Response, RuntimeError>>(1);
        self.inner
            .ctrl_tx
            .send(build(reply_tx))
            .map_err(|_| RuntimeError::ControlChannelDisconnected)?;
        match reply_rx.recv_timeout(self.inner.reply_timeout) {
            Ok(res) => res,
            Err(RecvTimeoutError::Timeout) => Err(RuntimeError::ControlTimeout { op }),
            Err(RecvTimeoutError::Disconnected) => Err(RuntimeError::ControlChannelDisconnected),
        }
    }

    /// Forwards a raw request. Storage requests in the reply have already
    /// been served by the worker and are stripped.
    pub fn execute(&self, request: Request) -> Result<Response, RuntimeError> {
        self.send_with_reply("execute", |reply| ControlMessage::Execute(request, reply))
    }

    pub fn set_parameter(&self, param: InitParam) -> Result<(), RuntimeError> {
        self.execute(Request::new(Command::SetParameter(param)))
            .map(drop)
    }

    pub fn frame(&self, buttons: [u8; 2]) -> Result<Response, RuntimeError> {
        self.execute(Request::frame(buttons))
    }

    pub fn skip_frame(&self, buttons: [u8; 2]) -> Result<Response, RuntimeError> {
        self.execute(Request::skip_frame(buttons))
    }

    pub fn reset(&self) -> Result<(), RuntimeError> {
        self.execute(Request::new(Command::Reset)).map(drop)
    }

    /// Flushes save RAM and stops the worker. Later calls report a
    /// disconnected channel.
    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.execute(Request::new(Command::Shutdown)).map(drop)
    }

    /// Waits for the next frame slot, runs the skip-frames `pacer` asks for
    /// and then one drawn frame. Sound from the skipped frames is prepended
    /// to the returned sound.
    pub fn paced_frame(
        &self,
        pacer: &mut FramePacer,
        buttons: [u8; 2],
    ) -> Result<Response, RuntimeError> {
        let wait = pacer.remaining(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }

        let mut sound = Vec::new();
        for _ in 0..pacer.plan(Instant::now()) {
            if let Some(samples) = self.skip_frame(buttons)?.sound {
                sound.extend_from_slice(&samples);
            }
        }

        let mut response = self.frame(buttons)?;
        if !sound.is_empty() {
            if let Some(samples) = response.sound.take() {
                sound.extend_from_slice(&samples);
            }
            response.sound = Some(sound.into_boxed_slice());
        }
        Ok(response)
    }
}
