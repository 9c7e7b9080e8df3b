//! Account identifiers
//!
//! An [`AccountId`] is an opaque 32-byte key. Human-facing ids are built with
//! [`AccountId::named`], which zero-pads a UTF-8 tag. System vaults use
//! [`AccountId::vault`], which sets a leading `0xFF` marker byte no UTF-8 tag
//! can start with, so user-named accounts can never collide with component
//! custody accounts.

// ============================================================================
// AccountId
// ============================================================================

/// Opaque 32-byte account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(pub [u8; 32]);

/// Mint/burn counterparty in transfer events
pub const ZERO_ACCOUNT: AccountId = AccountId([0u8; 32]);

impl AccountId {
    /// Builds an id from a human-readable tag, truncated to 32 bytes and
    /// zero-padded.
    pub fn named(tag: &str) -> Self {
        let mut bytes = [0u8; 32];
        let src = tag.as_bytes();
        let n = src.len().min(32);
        bytes[..n].copy_from_slice(&src[..n]);
        AccountId(bytes)
    }

    /// Deterministic custody account for a system component.
    ///
    /// Layout: marker byte, component tag (up to 23 bytes), then a
    /// little-endian u64 discriminator in the final 8 bytes.
    pub fn vault(tag: &str, index: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xFF;
        let src = tag.as_bytes();
        let n = src.len().min(23);
        bytes[1..1 + n].copy_from_slice(&src[..n]);
        bytes[24..32].copy_from_slice(&index.to_le_bytes());
        AccountId(bytes)
    }

    /// True for ids produced by [`AccountId::vault`].
    pub fn is_vault(&self) -> bool {
        self.0[0] == 0xFF
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_vault() {
            let tag_len = self.0[1..24].iter().position(|&b| b == 0).unwrap_or(23);
            let tag = core::str::from_utf8(&self.0[1..1 + tag_len]).unwrap_or("?");
            let mut idx = [0u8; 8];
            idx.copy_from_slice(&self.0[24..32]);
            return write!(f, "{}#{}", tag, u64::from_le_bytes(idx));
        }
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(32);
        match core::str::from_utf8(&self.0[..len]) {
            Ok(s) if !s.is_empty() => f.write_str(s),
            _ => {
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Serde: hex strings, so ids can key JSON maps
// ============================================================================

#[cfg(feature = "serde")]
impl serde::Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> core::result::Result<S::Ok, S::Error> {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = [0u8; 64];
        for (i, b) in self.0.iter().enumerate() {
            out[i * 2] = HEX[(b >> 4) as usize];
            out[i * 2 + 1] = HEX[(b & 0x0f) as usize];
        }
        // all bytes are ASCII hex digits
        match core::str::from_utf8(&out) {
            Ok(text) => s.serialize_str(text),
            Err(_) => Err(serde::ser::Error::custom("hex encoding produced non-utf8")),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> core::result::Result<Self, D::Error> {
        struct HexVisitor;

        impl serde::de::Visitor<'_> for HexVisitor {
            type Value = AccountId;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("a 64-character hex string")
            }

            fn visit_str<E: serde::de::Error>(
                self,
                v: &str,
            ) -> core::result::Result<AccountId, E> {
                let raw = v.as_bytes();
                if raw.len() != 64 {
                    return Err(E::custom("account id must be 64 hex characters"));
                }
                let mut bytes = [0u8; 32];
                for (i, pair) in raw.chunks_exact(2).enumerate() {
                    let hi = hex_nibble(pair[0]).ok_or_else(|| E::custom("invalid hex digit"))?;
                    let lo = hex_nibble(pair[1]).ok_or_else(|| E::custom("invalid hex digit"))?;
                    bytes[i] = (hi << 4) | lo;
                }
                Ok(AccountId(bytes))
            }
        }

        fn hex_nibble(c: u8) -> Option<u8> {
            match c {
                b'0'..=b'9' => Some(c - b'0'),
                b'a'..=b'f' => Some(c - b'a' + 10),
                b'A'..=b'F' => Some(c - b'A' + 10),
                _ => None,
            }
        }

        d.deserialize_str(HexVisitor)
    }
}
