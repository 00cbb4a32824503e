//! Run-length decoding of an oversampled capture into a 5 byte frame.
//!
//! Each sample word holds successive readings of the data line, most
//! significant bit first. The sensor sends every data bit as a low pulse
//! followed by a high pulse whose length carries the value: short for 0,
//! long for 1. A bit is closed each time the line falls after a high run.
//!
//! The first two falling edges belong to the handshake (the pull-up high
//! after the start pulse is released, then the sensor's response high) and
//! are discarded.

use crate::error::ProtocolError;

/// Number of data bits in a frame.
pub const FRAME_BITS: i32 = 40;

/// Pair index of the first falling edge in a capture.
const PREAMBLE_PAIRS: i32 = -2;

/// Iterates over the line level of every reading in the capture.
fn levels(samples: &[u16]) -> impl Iterator<Item = bool> + '_ {
    samples
        .iter()
        .flat_map(|&word| (0..u16::BITS).rev().map(move |bit| word & (1 << bit) != 0))
}

/// Decodes a capture into the 5 frame bytes.
///
/// A high run longer than `one_bit_threshold` readings is a 1 bit.
/// Returns `ProtocolError::Framing` unless exactly 40 bits were closed.
/// The checksum is not verified here, see [`verify`].
pub fn decode(samples: &[u16], one_bit_threshold: u32) -> Result<[u8; 5], ProtocolError> {
    let mut frame = [0u8; 5];
    let mut prev = true;
    let mut count: u32 = 0;
    let mut pair = PREAMBLE_PAIRS;

    for level in levels(samples) {
        if level == prev {
            count += 1;
            continue;
        }

        if prev {
            // Falling edge: `count` is the length of the high run that just ended.
            if (0..FRAME_BITS).contains(&pair) && count > one_bit_threshold {
                let index = pair as usize;
                frame[index / 8] |= 1 << (7 - index % 8);
            }
            pair += 1;
        }

        count = 1;
        prev = level;
    }

    if pair == FRAME_BITS {
        Ok(frame)
    } else {
        Err(ProtocolError::Framing { pairs: pair })
    }
}

/// 8 bit truncated sum of the data bytes.
pub fn checksum(data: &[u8; 4]) -> u8 {
    data.iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
}

/// Checks the trailing checksum byte of a decoded frame.
pub fn verify(frame: &[u8; 5]) -> Result<(), ProtocolError> {
    let [b0, b1, b2, b3, expected] = *frame;
    let calculated = checksum(&[b0, b1, b2, b3]);
    if calculated == expected {
        Ok(())
    } else {
        Err(ProtocolError::ChecksumMismatch {
            expected,
            calculated,
        })
    }
}
