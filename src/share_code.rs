use rand::Rng;

/// Characters used in share codes. Leaves out O, 0, I and 1.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const DEFAULT_LENGTH: usize = 7;
pub const FALLBACK_LENGTH: usize = 8;
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

pub fn generate_share_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate a code that `exists` reports as unused.
///
/// After `max_attempts` collisions a longer code is returned unchecked; the
/// extra character makes a further collision unlikely.
pub fn generate_unique_share_code<F>(mut exists: F, max_attempts: usize) -> String
where
    F: FnMut(&str) -> bool,
{
    for _ in 0..max_attempts {
        let code = generate_share_code(DEFAULT_LENGTH);
        if !exists(&code) {
            return code;
        }
    }
    generate_share_code(FALLBACK_LENGTH)
}

/// True if every character of `code` belongs to the share-code alphabet.
pub fn is_valid_share_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| ALPHABET.contains(&b))
}
