//! Event payload codec (bincode, standard config).

use crate::error::{PersistenceError, Result};
use delegation_kernel::MutationEvent;

pub fn encode_event(event: &MutationEvent) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(event, bincode::config::standard())
        .map_err(|e| PersistenceError::Codec(e.to_string()))
}

pub fn decode_event(payload: &[u8]) -> Result<MutationEvent> {
    let (event, read) = bincode::serde::decode_from_slice::<MutationEvent, _>(payload, bincode::config::standard())
        .map_err(|e| PersistenceError::Codec(e.to_string()))?;
    if read != payload.len() {
        return Err(PersistenceError::Codec(format!(
            "{} trailing bytes after event",
            payload.len() - read
        )));
    }
    Ok(event)
}
