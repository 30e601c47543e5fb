//! Advertised algorithm lists, order determination, and list-intersection selection
//! (spec §4.4 Phases 2-3; grounded on `libp2p_secio_determine_order` / `libp2p_secio_select_best`
//! / `libp2p_secio_split_list` in the original C, and on the `Ordering`-returning style of
//! `netwarps-libp2p-rs/secio/src/support.rs`'s `select_agreement`).

use ring::digest;

use crate::error::SecioError;

/// P-521 is dropped: `ring::agreement` has no P-521 provider (see `meshwire-secio`'s README note
/// in the workspace root `DESIGN.md`, Open Question 2).
pub const SUPPORTED_EXCHANGES: &str = "P-256,P-384";
/// Blowfish is dropped: no maintained Blowfish-CTR crate is in use anywhere in this workspace.
pub const SUPPORTED_CIPHERS: &str = "AES-256,AES-128";
pub const SUPPORTED_HASHES: &str = "SHA256,SHA512";

/// Splits a comma-separated advertised list into its ordered entries.
pub fn split_list(list: &str) -> Vec<&str> {
    list.split(',').filter(|s| !s.is_empty()).collect()
}

/// `h = SHA256(key || nonce)`, the building block for order determination (spec §4.4 Phase 2).
fn hash_with_nonce(key: &[u8], nonce: &[u8]) -> [u8; 32] {
    let mut ctx = digest::Context::new(&digest::SHA256);
    ctx.update(key);
    ctx.update(nonce);
    let digest = ctx.finish();
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

/// Deterministic role assignment (spec §4.4 Phase 2).
///
/// Computes `h1 = SHA256(remote_public_key || local_nonce)` and
/// `h2 = SHA256(local_public_key || remote_nonce)` — note the cross-wiring, each hash mixes one
/// side's key with the *other* side's nonce, matching `libp2p_secio_determine_order` exactly — and
/// compares them lexicographically. Returns `Err(SecioError::SelfConnection)` when the two hashes
/// are equal, which the C reference does not guard against but spec §4.4/§9 requires.
pub fn determine_order(
    local_public_key: &[u8],
    local_nonce: &[u8],
    remote_public_key: &[u8],
    remote_nonce: &[u8],
) -> Result<i32, SecioError> {
    let h1 = hash_with_nonce(remote_public_key, local_nonce);
    let h2 = hash_with_nonce(local_public_key, remote_nonce);
    match h1.cmp(&h2) {
        std::cmp::Ordering::Greater => Ok(1),
        std::cmp::Ordering::Less => Ok(-1),
        std::cmp::Ordering::Equal => Err(SecioError::SelfConnection),
    }
}

/// Picks the first entry of the "lead" list that also appears in the "follower" list (spec §4.4
/// Phase 3). `order > 0` makes `local_list` the lead; `order < 0` makes `remote_list` the lead.
/// `order == 0` is rejected earlier by [`determine_order`] and never reaches here.
pub fn select_best<'a>(
    order: i32,
    local_list: &'a str,
    remote_list: &'a str,
    which: &'static str,
) -> Result<&'a str, SecioError> {
    let local = split_list(local_list);
    let remote = split_list(remote_list);
    let (lead, follower) = if order > 0 {
        (&local, &remote)
    } else {
        (&remote, &local)
    };
    for candidate in lead {
        if follower.contains(candidate) {
            return Ok(candidate);
        }
    }
    Err(SecioError::NoCommonAlgorithm { which })
}

/// Byte sizes of a chosen cipher's key material (spec §4.4 Phase 5).
pub fn cipher_sizes(cipher: &str) -> Option<(usize, usize)> {
    match cipher {
        "AES-128" => Some((16, 16)),
        "AES-256" => Some((16, 32)),
        _ => None,
    }
}

/// Secure Channel MAC size for the chosen hash (spec §4.5, "32 bytes for SHA-256").
pub fn mac_output_size(hash: &str) -> Option<usize> {
    match hash {
        "SHA256" => Some(32),
        "SHA512" => Some(64),
        _ => None,
    }
}

/// Key-stretch output carries a fixed 20-byte HMAC key per directional key, regardless of the
/// chosen hash (spec §4.4 Phase 5: "HMAC-SHA256 mac key 20 bytes"), matching
/// `libp2p_secio_stretch_keys`'s `hmac_size = 20` constant.
pub const STRETCHED_MAC_KEY_SIZE: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_antisymmetric() {
        let a_key = b"alice-long-term-key";
        let b_key = b"bob-long-term-key";
        let a_nonce = [1u8; 16];
        let b_nonce = [2u8; 16];

        let order_from_a = determine_order(a_key, &a_nonce, b_key, &b_nonce).unwrap();
        let order_from_b = determine_order(b_key, &b_nonce, a_key, &a_nonce).unwrap();
        assert_eq!(order_from_a, -order_from_b);
    }

    #[test]
    fn self_connection_is_rejected() {
        let key = b"same-key";
        let nonce = [9u8; 16];
        match determine_order(key, &nonce, key, &nonce) {
            Err(SecioError::SelfConnection) => {}
            other => panic!("expected SelfConnection, got {:?}", other),
        }
    }

    #[test]
    fn select_best_picks_leads_first_common_entry() {
        let picked = select_best(1, "AES-256,AES-128", "AES-128,AES-256", "cipher").unwrap();
        assert_eq!(picked, "AES-256");

        let picked_reversed = select_best(-1, "AES-256,AES-128", "AES-128,AES-256", "cipher").unwrap();
        assert_eq!(picked_reversed, "AES-128");
    }

    #[test]
    fn select_best_fails_on_empty_intersection() {
        match select_best(1, "AES-256", "AES-128", "cipher") {
            Err(SecioError::NoCommonAlgorithm { which: "cipher" }) => {}
            other => panic!("expected NoCommonAlgorithm, got {:?}", other),
        }
    }

    #[test]
    fn selection_is_commutative_under_order_negation() {
        let local = "P-256,P-384";
        let remote = "P-384,P-256";
        let a = select_best(1, local, remote, "curve").unwrap();
        let b = select_best(-1, remote, local, "curve").unwrap();
        assert_eq!(a, b);
    }
}
