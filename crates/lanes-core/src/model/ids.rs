use rand::{Rng, distributions::Alphanumeric};

/// Length of generated identifiers (same entropy budget as a nanoid).
pub const ID_LEN: usize = 21;

/// Generate a client-side identifier for a new project or task.
///
/// Ids are assigned before the remote store acknowledges the entity so the
/// caller can reference it immediately.
#[must_use]
pub fn new_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
