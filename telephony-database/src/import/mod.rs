/*!
 Import reconcilers: one per table family.

 Each reconciler consumes the record sequence produced by the codec and
 replays it as inserts against the device store: unknown fields are projected
 away against the destination's column sets, conversation identifiers are
 remapped through a run-scoped translation table, duplicates are optionally
 skipped, and parent rows are inserted before their children with the
 parent's newly assigned identifier threaded through.

 A malformed input document is fatal and aborts the run; a single record's
 failed insert is logged and skipped; cancellation stops cleanly with the
 partial totals.
*/

pub mod blocked;
pub mod calls;
pub mod contacts;
pub mod messages;

pub use blocked::import_blocked_numbers;
pub use calls::import_call_log;
pub use contacts::import_contacts;
pub use messages::import_messages;
