const CRC_INITIAL: u16 = 0xFFFF;
const CRC_POLYNOMIAL: u16 = 0x1021;

/// Computes the CRC-16/CCITT-FALSE checksum of the input and returns it as four uppercase hex digits.
///
/// This is the variant mandated for merchant-presented QR trailers: register seeded with `0xFFFF`, each byte
/// XORed into the high byte, eight shift rounds against polynomial `0x1021`, no final XOR.
pub fn crc16(input: &str) -> String {
    let mut crc = CRC_INITIAL;
    for byte in input.bytes() {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    format!("{crc:04X}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_vectors() {
        // "123456789" is the published check value for CRC-16/CCITT-FALSE
        assert_eq!(crc16("123456789"), "29B1");
        assert_eq!(crc16("ABC"), "F508");
        assert_eq!(crc16(""), "FFFF");
    }

    #[test]
    fn deterministic() {
        let payload = "00020101021126370014ID.EXAMPLE.WWW0215ID10200211223345802ID6304";
        assert_eq!(crc16(payload), crc16(payload));
    }

    #[test]
    fn output_is_zero_padded() {
        for input in ["", "a", "checksum me", "000201"] {
            let crc = crc16(input);
            assert_eq!(crc.len(), 4);
            assert!(crc.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)));
        }
    }
}
