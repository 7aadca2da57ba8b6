// Job application CRUD. Every record is scoped to the user who created it:
// reads of someone else's record look like a miss, writes are forbidden.

pub mod handlers;
