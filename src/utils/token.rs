use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Opaque device token handed to a browser on first contact and cached
/// client-side. Random alphanumeric, no embedded meaning.
pub fn generate_device_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
