use std::mem;

use crossbeam_channel::Receiver;
use fam_core::{
    Famicom,
    request::{Command, Request, Response, StorageRequest},
};
use tracing::{debug, trace, warn};

use crate::storage::Storage;

use super::{control::ControlMessage, types::RuntimeError};

pub(crate) struct Runner {
    famicom: Famicom,
    storage: Box<dyn Storage>,
    ctrl_rx: Receiver<ControlMessage>,
}

impl Runner {
    pub(crate) fn new(
        famicom: Famicom,
        storage: Box<dyn Storage>,
        ctrl_rx: Receiver<ControlMessage>,
    ) -> Self {
        Self {
            famicom,
            storage,
            ctrl_rx,
        }
    }

    pub(crate) fn run(&mut self) {
        while let Ok(msg) = self.ctrl_rx.recv() {
            match msg {
                ControlMessage::Stop => break,
                ControlMessage::Execute(request, reply) => {
                    let shutdown = request.command == Command::Shutdown;
                    let _ = reply.send(self.execute(request));
                    if shutdown {
                        break;
                    }
                }
            }
        }
        if !self.famicom.is_halted() {
            self.shut_down();
        }
        debug!("runtime thread exiting");
    }

    /// Stopped without a `Shutdown` request; still flush save RAM.
    fn shut_down(&mut self) {
        debug!("stopping without shutdown request");
        if let Err(err) = self.execute(Request::new(Command::Shutdown)) {
            warn!(%err, "shutdown on stop failed");
        }
    }

    /// Runs one request and services its storage traffic before replying.
    fn execute(&mut self, request: Request) -> Result<Response, RuntimeError> {
        let mut response = self.famicom.execute(request)?;
        for storage in mem::take(&mut response.storage) {
            match storage {
                StorageRequest::Load { key, size } => {
                    trace!(%key, size, "loading save RAM");
                    let data = self.storage.load(&key, size);
                    self.famicom
                        .execute(Request::new(Command::StorageResponse(data)))?;
                }
                StorageRequest::Save { key, data } => {
                    trace!(%key, len = data.len(), "saving save RAM");
                    self.storage.save(&key, &data);
                }
            }
        }
        Ok(response)
    }
}
