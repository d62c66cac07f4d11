//! Immutable lookup tables shared by the channels and the mixer.

use once_cell::sync::Lazy;

/// Length counter reload values indexed by the 5-bit field of the length
/// registers.
#[rustfmt::skip]
pub(super) const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14,
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// 12.5%, 25%, 50% and negated 25% duty sequences.
pub(super) const PULSE_DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 1, 1],
    [0, 0, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 0, 0],
];

#[rustfmt::skip]
pub(super) const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0,
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// NTSC noise periods in CPU cycles.
#[rustfmt::skip]
pub(super) const NOISE_PERIODS: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// NTSC DMC output rates in CPU cycles per bit.
#[rustfmt::skip]
pub(super) const DMC_RATES: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// `95.52 / (8128 / n + 100)` for the summed pulse levels `n` in `0..=30`.
pub(super) static PULSE_MIX: Lazy<[f32; 31]> = Lazy::new(|| {
    let mut table = [0.0; 31];
    for (n, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = 95.52 / (8128.0 / n as f32 + 100.0);
    }
    table
});

/// `163.67 / (24329 / n + 100)` for `n = 3 * triangle + 2 * noise + dmc`.
pub(super) static TND_MIX: Lazy<[f32; 203]> = Lazy::new(|| {
    let mut table = [0.0; 203];
    for (n, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = 163.67 / (24329.0 / n as f32 + 100.0);
    }
    table
});
