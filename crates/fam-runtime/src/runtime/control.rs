use crossbeam_channel::Sender;
use fam_core::request::{Request, Response};

use super::types::RuntimeError;

pub(crate) type ControlReplySender = Sender<Result<Response, RuntimeError>>;

pub(crate) enum ControlMessage {
    Stop,
    Execute(Request, ControlReplySender),
}
