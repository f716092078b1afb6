//! Fixed-point Q-format arithmetic and the base-10 exponential used to turn a ReplayGain dB
//! value into a linear scale factor.
//!
//! The Q28 constants and the range-reduction shape of [`exp10`] reproduce, bit-for-bit, the
//! values used by the reference metadata reader this module was grounded on, so that
//! `factor()` output matches it exactly rather than merely approximating it.

/// `x * y`, both in `Q(frac_bits)`, rounded toward zero.
pub fn mul(x: i64, y: i64, frac_bits: u32) -> i64 {
    (x * y) >> frac_bits
}

/// `x / y`, both in `Q(frac_bits)`.
pub fn div(x: i64, y: i64, frac_bits: u32) -> i64 {
    (x << frac_bits) / y
}

const FP28_BITS: u32 = 28;
const FP28_LN2: i64 = 186_065_279;
const FP28_LN2_INV: i64 = 387_270_501;
const FP28_LN10: i64 = 618_095_479;
const FP28_EXP_ZERO: i64 = 44_739_243;
const FP28_EXP_ONE: i64 = -745_654;
const FP28_EXP_TWO: i64 = 12_428;

/// `10^(x / 2^frac_bits)`, returning a value in `Q(frac_bits)`.
///
/// Ported directly from the reference `FpExp10`, not merely its constants: the Q28 constants are
/// rescaled down to `frac_bits` up front, `x == 0` short-circuits to `1.0` before any base
/// conversion, and `e^r` (after range reduction `x = k*ln2 + r`) is evaluated as the rational form
/// `1 + 2r / (poly(r2) - r)`, never a plain polynomial in `r`.
pub fn exp10(x: i64, frac_bits: u32) -> i64 {
    let fp_one = 1i64 << frac_bits;
    let fp_half = 1i64 << (frac_bits - 1);
    let fp_two = 2i64 << frac_bits;
    let fp_mask = fp_one - 1;

    let shift = FP28_BITS - frac_bits;
    let fp_ln2_inv = FP28_LN2_INV >> shift;
    let fp_ln2 = FP28_LN2 >> shift;
    let fp_ln10 = FP28_LN10 >> shift;
    let fp_exp_zero = FP28_EXP_ZERO >> shift;
    let fp_exp_one = FP28_EXP_ONE >> shift;
    let fp_exp_two = FP28_EXP_TWO >> shift;

    // exp(0) = 1
    if x == 0 {
        return fp_one;
    }

    // Convert from base 10 to base e.
    let mut x = mul(x, fp_ln10, frac_bits);

    // Range reduce: x = k*ln2 + r, with k rounded to the nearest integer and held as k*fp_one.
    let mut k = (mul(x.abs(), fp_ln2_inv, frac_bits) + fp_half) & !fp_mask;
    if x < 0 {
        k = -k;
    }

    x -= mul(k, fp_ln2, frac_bits);
    let z = mul(x, x, frac_bits);
    let r = fp_two
        + mul(
            z,
            fp_exp_zero + mul(z, fp_exp_one + mul(z, fp_exp_two, frac_bits), frac_bits),
            frac_bits,
        );
    let xp = fp_one + div(mul(fp_two, x, frac_bits), r - x, frac_bits);

    let k_scale = if k < 0 { fp_one >> (-k >> frac_bits) } else { fp_one << (k >> frac_bits) };

    mul(k_scale, xp, frac_bits)
}

/// `factor(db) = 10^(db / 20)` for a dB value expressed in `Q(frac_bits)`.
pub fn factor(db_fp: i64, frac_bits: u32) -> i64 {
    exp10(div(db_fp, 20 << frac_bits, frac_bits), frac_bits)
}

/// Parses a decimal string (with optional leading sign and a single `.`) into `Q(precision)`,
/// matching the digit-accumulation algorithm of the reference `FPatof`: the fractional part is
/// padded out to `frac_max = (precision*4 + 12) / 13` digits before being combined with the
/// integer part.
pub fn fpatof(s: &str, precision: u32) -> i64 {
    let int_one = 1i64 << precision;
    let frac_max = ((precision as i64) * 4 + 12) / 13;

    let s = s.trim();
    let mut chars = s.chars().peekable();

    let sign: i64 = match chars.peek() {
        Some('-') => {
            chars.next();
            -1
        }
        Some('+') => {
            chars.next();
            1
        }
        _ => 1,
    };

    let mut int_part: i64 = 0;
    let mut frac_part: i64 = 0;
    let mut frac_count: i64 = 0;
    let mut frac_max_int: i64 = 1;
    let mut point = false;

    for c in chars {
        if c == '.' {
            if point {
                break;
            }
            point = true;
        } else if let Some(d) = c.to_digit(10) {
            if point {
                if frac_count < frac_max {
                    frac_part = frac_part * 10 + d as i64;
                    frac_count += 1;
                    frac_max_int *= 10;
                }
            } else {
                int_part = int_part * 10 + d as i64;
            }
        } else {
            break;
        }
    }

    while frac_count < frac_max {
        frac_part *= 10;
        frac_count += 1;
        frac_max_int *= 10;
    }

    sign * (int_part * int_one + (frac_part * int_one) / frac_max_int)
}
