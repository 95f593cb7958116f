#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Named-event channel shared by the Arco client core.
//!
//! The backend announces that authoritative state changed by emitting a bare
//! event name; listeners re-fetch whatever they mirror. Names are either a
//! plain [`EventKind`] or a composite `kind:suffix` built from identifiers so
//! subscribers filter by string match instead of payload parsing.
//!
//! Layout: `names.rs` (event kinds + composite builders), `channel.rs`
//! (listener handles + channel trait), `routing.rs` (in-process bus).

pub mod channel;
pub mod names;
pub mod routing;

pub use channel::{EventChannel, EventEnvelope, EventHandler, EventId, ListenerHandle};
pub use names::{EventKind, EventName};
pub use routing::{EventBus, EventStream};
