//! The MD5 hash type dpkg records for each shipped file.

/// A 16-byte MD5 digest, as recorded in `.md5sums` files and `dpkg-query`'s
/// `${Conffiles}` output.
///
/// Always rendered as 32 lowercase hex characters, matching both of those
/// on-disk formats, so this is what the hash verifier pool, the `.md5sums`
/// parser and the conffile status parser all produce and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Hash(pub [u8; 16]);

/// Failure to parse a hash from dpkg metadata.
#[derive(Debug, thiserror::Error)]
pub enum HashParseError {
    #[error("hash is {0} bytes long, expected 32 hex characters")]
    WrongLength(usize),
    #[error("hash contains non-hex characters: {0}")]
    InvalidHex(#[from] faster_hex::Error),
}

impl Hash {
    /// Parse a 32-character lowercase hex digest.
    pub fn parse(hex: &[u8]) -> Result<Self, HashParseError> {
        if hex.len() != 32 {
            return Err(HashParseError::WrongLength(hex.len()));
        }
        let mut buf = [0u8; 16];
        faster_hex::hex_decode(hex, &mut buf)?;
        Ok(Self(buf))
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = [0u8; 32];
        let s = faster_hex::hex_encode(&self.0, &mut buf).expect("buffer is exactly sized");
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_hex() {
        let hex = b"d41d8cd98f00b204e9800998ecf8427e";
        let hash = Hash::parse(hex).unwrap();
        assert_eq!(hash.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            Hash::parse(b"abc"),
            Err(HashParseError::WrongLength(3))
        ));
    }
}
