//! Deterministic option ids.

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Compute the stable id for an option shown on page `base_index`.
///
/// The id is `"${baseIndex}-${hex}"` where `hex` is a 32-bit FNV-1a hash of
/// the option text with the hash state seeded by `base_index`. Ids are pure in
/// their inputs: the same page index and text always produce the same id, so
/// ids emitted at commit time never need recomputing.
///
/// # Examples
///
/// ```
/// use taleweave_core::make_option_id;
///
/// let id = make_option_id(1, "Open the door");
/// assert!(id.starts_with("1-"));
/// assert_eq!(id, make_option_id(1, "Open the door"));
/// assert_ne!(id, make_option_id(2, "Open the door"));
/// ```
pub fn make_option_id(base_index: i64, text: &str) -> String {
    let mut hash = FNV_OFFSET ^ (base_index as u32).wrapping_mul(0x9e37_79b9);
    for byte in text.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{base_index}-{hash:08x}")
}
