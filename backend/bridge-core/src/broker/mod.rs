//! File IPC request broker.
//!
//! The scripting host reads command lines from a shared command file and
//! answers into a shared single-slot response file. Each request clears the
//! response file, appends its command, then polls until the host answers or the
//! request kind's attempt budget runs out. Answers are parsed into records and
//! broadcast to every client.
//!
//! Both files are shared by every request, so requests run one at a time
//! through a single actor ([`BrokerHandle`]); anything arriving meanwhile waits
//! in a bounded queue and is rejected as busy once that queue is full.

mod actor;
mod channel;
mod request;
mod response;

pub use actor::{BrokerHandle, BrokerOutcome, BrokerPolicies};
pub use channel::{FileChannel, IpcChannel};
pub use request::{BrokerRequest, BypassCommand, FxCommand, ReadRequest, RequestKind};
pub use response::{ResponseRecord, ResponseSet, ready_answer};
