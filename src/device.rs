//! Device identifier generation.
//!
//! A trial-subscription request is tagged with a device identifier so the
//! server can tell trial claims from different installations apart. Three
//! shapes are produced:
//!
//! - [`generate_device_id`]: a standard random (version 4) UUID.
//! - [`generate_device_id_custom`]: the hand-rolled
//!   `xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx` template used by the editor
//!   extension, reproduced bit for bit.
//! - [`generate_random_machine_id`]: 32 lowercase hex digits, no separators.
//!
//! All functions are stateless and safe to call from any thread. Uniqueness
//! is not enforced; collisions are left to the randomness of the source.

use rand::Rng;
use uuid::Uuid;

/// Template for [`generate_device_id_custom`].
const CUSTOM_TEMPLATE: &str = "xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx";

/// Length of [`generate_random_machine_id`] output.
pub const MACHINE_ID_LEN: usize = 32;

/// Generate a random version 4 UUID in canonical lowercase form.
pub fn generate_device_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a device id by filling [`CUSTOM_TEMPLATE`].
///
/// Each `x` becomes one random hex digit. Each `y` becomes `(r & 0x3) | 0x8`
/// for a random nibble `r`, which always lands in `{8, 9, a, b}`. Every other
/// character of the template is copied verbatim.
pub fn generate_device_id_custom() -> String {
    let mut rng = rand::rng();
    CUSTOM_TEMPLATE
        .chars()
        .map(|c| match c {
            'x' => hex_digit(rng.random_range(0..16)),
            'y' => hex_digit((rng.random_range(0..16) & 0x3) | 0x8),
            other => other,
        })
        .collect()
}

/// Generate a 32-character lowercase hex machine id, one random nibble per
/// character.
pub fn generate_random_machine_id() -> String {
    let mut rng = rand::rng();
    (0..MACHINE_ID_LEN)
        .map(|_| hex_digit(rng.random_range(0..16)))
        .collect()
}

fn hex_digit(nibble: u32) -> char {
    // nibble is always < 16 here
    char::from_digit(nibble, 16).unwrap_or('0')
}
