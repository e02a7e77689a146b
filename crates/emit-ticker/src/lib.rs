#![doc = "Resettable periodic ticker that drops ticks for slow receivers."]

pub mod clock;
pub mod shutdown;
pub mod slot;
pub mod ticker;

pub use clock::*;
pub use shutdown::{shutdown, Shutdown, ShutdownListener};
pub use slot::TickSlot;
pub use ticker::*;
