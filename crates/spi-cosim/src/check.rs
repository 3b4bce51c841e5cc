use crate::{CosimError, HexWord};

/// The add-one transform the peer is expected to apply, modulo 2^32.
pub fn expected_response(sent: u32) -> u32 {
    sent.wrapping_add(1)
}

pub fn check_response(sent: u32, received: u32) -> Result<(), CosimError> {
    let expected = expected_response(sent);
    if received != expected {
        return Err(CosimError::Mismatch {
            received: HexWord(received),
            expected: HexWord(expected),
        });
    }
    Ok(())
}
