//! Centralized error type for the ttymidi umbrella crate.
//!
//! Wraps both subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Wire: {0}")]
    Wire(#[from] ttymidi_wire::Error),

    #[cfg(feature = "bridge")]
    #[error("Bridge: {0}")]
    Bridge(#[from] ttymidi_bridge::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_text() -> Result<Vec<u8>> {
        Ok(ttymidi_wire::encode(&ttymidi_wire::WireMessage::text_comment("x"))?)
    }

    #[test]
    fn test_wire_error_propagates() {
        let err = encode_text().unwrap_err();
        assert!(matches!(
            err,
            Error::Wire(ttymidi_wire::Error::EncodeContract { kind: "TextComment" })
        ));
        assert_eq!(err.to_string(), "Wire: TextComment has no wire representation");
    }

    #[cfg(feature = "bridge")]
    #[test]
    fn test_bridge_error_propagates() {
        fn build() -> Result<ttymidi_bridge::Bridge> {
            Ok(ttymidi_bridge::Bridge::builder().max_frame_size(0).build()?)
        }
        assert!(matches!(
            build(),
            Err(Error::Bridge(ttymidi_bridge::Error::InvalidConfig(_)))
        ));
    }
}
