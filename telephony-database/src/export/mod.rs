/*!
 Export walkers: one per table family.

 Each walker opens a forward cursor over the device store, assembles a nested
 record per row (joining child tables by parent identifier), and streams it
 through the codec to the output. Every walker polls the cancellation token
 once per row, reports "N of M" progress after every row, and truncates early
 without error when the record cap is reached.
*/

pub mod blocked;
pub mod calls;
pub mod contacts;
pub mod messages;

pub use blocked::export_blocked_numbers;
pub use calls::export_call_log;
pub use contacts::export_contacts;
pub use messages::export_messages;

/// Outcome of one family's walk
pub(crate) enum Walk {
    Complete(u64),
    Cancelled(u64),
}
