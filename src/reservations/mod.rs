mod catalog;
pub(crate) mod ledger;
mod status;

pub use catalog::{CommandCatalog, StoreCommandCatalog};
pub use ledger::{CleanupReport, NewReservation, ReservationDetails, ReservationLedger};
pub use status::{status_of, ReservationStatus};
