pub mod clock;
pub mod documents;
pub mod inventory;
pub mod metrics;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use documents::DocumentService;
pub use inventory::InventoryLedger;
pub use metrics::{gather_metrics, init_metrics};
pub use store::{DocumentStore, DuePage, MemoryStore, PgStore};
