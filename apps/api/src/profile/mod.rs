// Profile store: the user's structured facts in PostgreSQL, the validation
// rules applied before saving, and the reindex hook run after every change.

pub mod handlers;
pub mod reindex;
pub mod store;
pub mod validation;
