use rand::rngs::OsRng;
use rand::{Rng, RngCore};

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub(crate) const ACCESS_CODE_LEN: usize = 8;

/// Random login code drawn from an alphabet without look-alike characters (no 0/O, 1/I).
pub(crate) fn generate_access_code() -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(ACCESS_CODE_LEN);
    for _ in 0..ACCESS_CODE_LEN {
        let index = rng.gen_range(0..ALPHABET.len());
        output.push(ALPHABET[index] as char);
    }
    output
}

/// Generates `count` distinct codes, none of which appear in `taken`.
pub(crate) fn generate_unique_codes(count: usize, taken: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::with_capacity(count);
    while codes.len() < count {
        let code = generate_access_code();
        if taken.contains(&code) || codes.contains(&code) {
            continue;
        }
        codes.push(code);
    }
    codes
}

/// 128-bit login session identifier, hex encoded.
pub(crate) fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
