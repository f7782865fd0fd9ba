//! Runtime components: the event consumer loop, event handlers, and the
//! application lifecycle.

pub mod consumer;
pub mod handlers;
pub mod lifecycle;

pub use consumer::{EventConsumer, EventConsumerBuilder, MissingField};
pub use handlers::{EventHandler, HandlerError, IngestionHandler};
pub use lifecycle::{Application, shutdown_signal};
