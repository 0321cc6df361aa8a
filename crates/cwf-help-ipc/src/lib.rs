//! Cross-window invocation protocol for the help viewer.
//!
//! A help viewer may run in a different browser window than the page that
//! asks for help. The two sides talk through named request queues carrying
//! invocation requests (a method name plus positional arguments).
//!
//! # Architecture
//!
//! - [`request`]: the wire type [`InvocationRequest`] and the typed [`ViewerCommand`] set
//! - [`queue`]: named queues, their registry, and keep-alive tracking
//! - [`transport`]: length-prefixed codec for bridging queues over byte streams
//! - [`error`]: error type and `Result` alias
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cwf_help_ipc::{InvocationQueue, QueueRegistry, ViewerCommand, window_name};
//!
//! let registry = Arc::new(QueueRegistry::new());
//! let mut viewer_queue = InvocationQueue::open(&registry, window_name("page1"), None, None)?;
//!
//! let handle = registry.get("helppage1").expect("registered");
//! handle.send_command(&ViewerCommand::Show)?;
//!
//! let request = viewer_queue.try_next().expect("delivered");
//! assert_eq!(ViewerCommand::from_request(&request)?, ViewerCommand::Show);
//! # Ok::<(), cwf_help_ipc::Error>(())
//! ```

pub mod error;
pub mod queue;
pub mod request;
pub mod transport;

pub use error::{Error, Result};
pub use queue::{DEFAULT_KEEP_ALIVE, InvocationQueue, QueueHandle, QueueRegistry, window_name};
pub use request::{
    InvocationRequest, METHOD_CLOSE, METHOD_LOAD, METHOD_MERGE_HELP_SET, METHOD_SET_REMOTE_QUEUE,
    METHOD_SHOW, VIEW_TYPE_KEY, ViewerCommand,
};
pub use transport::{CodecError, InvocationCodec};

pub use cwf_help_types::{HelpModule, HelpViewType};
