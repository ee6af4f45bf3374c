//! Packed BCD helpers for EMV `n` format fields (amounts, currency codes).

use crate::error::BcdError;

/// Encode `value` as `digits` packed BCD digits, left-padded with zeros.
pub fn encode_numeric(value: u64, digits: usize) -> Result<Vec<u8>, BcdError> {
    if digits == 0 || digits % 2 != 0 {
        return Err(BcdError::OddDigits(digits));
    }
    let mut out = vec![0u8; digits / 2];
    let mut rest = value;
    for byte in out.iter_mut().rev() {
        let low = (rest % 10) as u8;
        rest /= 10;
        let high = (rest % 10) as u8;
        rest /= 10;
        *byte = (high << 4) | low;
    }
    if rest != 0 {
        return Err(BcdError::Overflow { value, digits });
    }
    Ok(out)
}

/// Decode packed BCD digits into an integer.
pub fn decode_numeric(bytes: &[u8]) -> Result<u64, BcdError> {
    // 19 digits always fit in a u64.
    if bytes.len() > 9 {
        return Err(BcdError::TooLong(bytes.len()));
    }
    let mut value = 0u64;
    for (index, byte) in bytes.iter().enumerate() {
        for nibble in [byte >> 4, byte & 0x0F] {
            if nibble > 9 {
                return Err(BcdError::InvalidNibble { index, nibble });
            }
            value = value * 10 + u64::from(nibble);
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_n12() {
        assert_eq!(
            encode_numeric(1250, 12).unwrap(),
            vec![0x00, 0x00, 0x00, 0x00, 0x12, 0x50]
        );
        assert_eq!(decode_numeric(&[0x00, 0x00, 0x00, 0x00, 0x12, 0x50]).unwrap(), 1250);
    }

    #[test]
    fn currency_n4() {
        assert_eq!(encode_numeric(978, 4).unwrap(), vec![0x09, 0x78]);
        assert_eq!(decode_numeric(&[0x08, 0x40]).unwrap(), 840);
    }

    #[test]
    fn overflow_rejected() {
        assert_eq!(
            encode_numeric(10_000, 4).unwrap_err(),
            BcdError::Overflow {
                value: 10_000,
                digits: 4
            }
        );
        assert_eq!(encode_numeric(1, 3).unwrap_err(), BcdError::OddDigits(3));
    }

    #[test]
    fn invalid_nibble_rejected() {
        assert_eq!(
            decode_numeric(&[0x12, 0x3A]).unwrap_err(),
            BcdError::InvalidNibble {
                index: 1,
                nibble: 0x0A
            }
        );
    }
}
