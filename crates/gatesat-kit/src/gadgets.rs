//! Circuit gadgets built on the public gate API.
//!
//! [`Bus`] is a fixed-width, MSB-first vector of signed circuit literals
//! with bitwise, arithmetic, and comparison operations. Everything here
//! synthesizes plain gates through [`Model`]; no privileged access.

use gatesat_base::Result;

use crate::model::Model;

/// A fixed-width bus of circuit literals, most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bus {
    bits: Vec<i32>,
}

impl Bus {
    /// Creates a bus of `width` fresh variables.
    ///
    /// # Panics
    /// Panics if `width` is 0.
    pub fn new(model: &mut Model, width: usize) -> Self {
        assert!(width > 0, "bus width must be positive");
        Self {
            bits: (0..width).map(|_| model.var()).collect(),
        }
    }

    /// Wraps existing literals, MSB first.
    ///
    /// # Panics
    /// Panics on an empty slice or a 0 literal.
    pub fn from_lits(bits: impl Into<Vec<i32>>) -> Self {
        let bits = bits.into();
        assert!(!bits.is_empty(), "bus width must be positive");
        assert!(bits.iter().all(|&b| b != 0), "0 is not a valid circuit literal");
        Self { bits }
    }

    /// A bus holding a constant, built from the model's constant literals.
    ///
    /// # Panics
    /// Panics if `width` is 0, exceeds 64, or cannot hold `value`.
    pub fn constant(model: &mut Model, value: u64, width: usize) -> Self {
        assert!(width > 0 && width <= 64, "bus width must be in 1..=64");
        assert!(
            width == 64 || value < (1u64 << width),
            "{value} does not fit in {width} bits"
        );
        let t = model.lit_true();
        let bits = (0..width)
            .map(|i| {
                if (value >> (width - 1 - i)) & 1 == 1 {
                    t
                } else {
                    -t
                }
            })
            .collect();
        Self { bits }
    }

    /// The width in bits.
    #[must_use]
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// The literal of the bit at `index`, MSB first.
    #[must_use]
    pub fn bit(&self, index: usize) -> i32 {
        self.bits[index]
    }

    /// All literals, MSB first.
    #[must_use]
    pub fn bits(&self) -> &[i32] {
        &self.bits
    }

    fn zip_with(
        &self,
        model: &mut Model,
        other: &Bus,
        gate: impl Fn(&mut Model, i32, i32) -> i32,
    ) -> Bus {
        assert_eq!(self.width(), other.width(), "bus widths differ");
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(&a, &b)| gate(model, a, b))
            .collect();
        Bus { bits }
    }

    /// Bitwise AND.
    pub fn and(&self, model: &mut Model, other: &Bus) -> Bus {
        self.zip_with(model, other, Model::and)
    }

    /// Bitwise OR.
    pub fn or(&self, model: &mut Model, other: &Bus) -> Bus {
        self.zip_with(model, other, Model::or)
    }

    /// Bitwise XOR.
    pub fn xor(&self, model: &mut Model, other: &Bus) -> Bus {
        self.zip_with(model, other, Model::xor)
    }

    /// Bitwise negation. Free: only the literal signs flip.
    #[must_use]
    pub fn not(&self) -> Bus {
        Bus {
            bits: self.bits.iter().map(|&b| -b).collect(),
        }
    }

    /// Rotates left by `n`. Free: bits only change position.
    #[must_use]
    pub fn rotl(&self, n: usize) -> Bus {
        let mut bits = self.bits.clone();
        let len = bits.len();
        bits.rotate_left(n % len);
        Bus { bits }
    }

    /// Rotates right by `n`.
    #[must_use]
    pub fn rotr(&self, n: usize) -> Bus {
        let mut bits = self.bits.clone();
        let len = bits.len();
        bits.rotate_right(n % len);
        Bus { bits }
    }

    /// Shifts left by `n`, filling with zeros.
    pub fn shl(&self, model: &mut Model, n: usize) -> Bus {
        let width = self.width();
        let n = n.min(width);
        let f = model.lit_false();
        let mut bits: Vec<i32> = self.bits[n..].to_vec();
        bits.extend(std::iter::repeat(f).take(n));
        debug_assert_eq!(bits.len(), width);
        Bus { bits }
    }

    /// Shifts right by `n`, filling with zeros.
    pub fn shr(&self, model: &mut Model, n: usize) -> Bus {
        let width = self.width();
        let n = n.min(width);
        let f = model.lit_false();
        let mut bits: Vec<i32> = std::iter::repeat(f).take(n).collect();
        bits.extend_from_slice(&self.bits[..width - n]);
        Bus { bits }
    }

    /// Ripple-carry addition, truncating the final carry.
    pub fn add(&self, model: &mut Model, other: &Bus) -> Bus {
        self.add_with_carry(model, other).0
    }

    /// Ripple-carry addition returning `(sum, carry_out)`.
    ///
    /// Per bit: `sum = a ^ b ^ c`, `carry = (a & b) | (c & (a | b))`.
    pub fn add_with_carry(&self, model: &mut Model, other: &Bus) -> (Bus, i32) {
        assert_eq!(self.width(), other.width(), "bus widths differ");
        let width = self.width();
        let mut carry = model.lit_false();
        let mut bits = vec![0; width];
        for i in (0..width).rev() {
            let a = self.bits[i];
            let b = other.bits[i];
            let a_xor_b = model.xor(a, b);
            bits[i] = model.xor(a_xor_b, carry);
            let a_and_b = model.and(a, b);
            let a_or_b = model.or(a, b);
            let carry_through = model.and(carry, a_or_b);
            carry = model.or(a_and_b, carry_through);
        }
        (Bus { bits }, carry)
    }

    /// A literal that is true exactly when the buses are equal.
    pub fn equals(&self, model: &mut Model, other: &Bus) -> i32 {
        assert_eq!(self.width(), other.width(), "bus widths differ");
        let mut acc: Option<i32> = None;
        for (&a, &b) in self.bits.iter().zip(&other.bits) {
            let bit_eq = -model.xor(a, b);
            acc = Some(match acc {
                None => bit_eq,
                Some(prev) => model.and(prev, bit_eq),
            });
        }
        acc.expect("bus width must be positive")
    }

    /// A literal that is true exactly when the buses differ.
    pub fn not_equals(&self, model: &mut Model, other: &Bus) -> i32 {
        -self.equals(model, other)
    }

    /// Unsigned less-than.
    pub fn lt(&self, model: &mut Model, other: &Bus) -> i32 {
        assert_eq!(self.width(), other.width(), "bus widths differ");
        // scan from the MSB: self < other when some bit has self 0 and
        // other 1 while every higher bit is equal
        let mut result: Option<i32> = None;
        let mut prefix_eq: Option<i32> = None;
        for (&a, &b) in self.bits.iter().zip(&other.bits) {
            let here = model.and(-a, b);
            let term = match prefix_eq {
                None => here,
                Some(eq) => model.and(eq, here),
            };
            result = Some(match result {
                None => term,
                Some(prev) => model.or(prev, term),
            });
            let bit_eq = -model.xor(a, b);
            prefix_eq = Some(match prefix_eq {
                None => bit_eq,
                Some(eq) => model.and(eq, bit_eq),
            });
        }
        result.expect("bus width must be positive")
    }

    /// Unsigned less-or-equal.
    pub fn le(&self, model: &mut Model, other: &Bus) -> i32 {
        let lt = self.lt(model, other);
        let eq = self.equals(model, other);
        model.or(lt, eq)
    }

    /// Unsigned greater-than.
    pub fn gt(&self, model: &mut Model, other: &Bus) -> i32 {
        other.lt(model, self)
    }

    /// Unsigned greater-or-equal.
    pub fn ge(&self, model: &mut Model, other: &Bus) -> i32 {
        other.le(model, self)
    }

    /// Reads the bus as an unsigned integer after a Sat solve.
    ///
    /// # Panics
    /// Panics if the width exceeds 64.
    pub fn value(&self, model: &Model) -> Result<u64> {
        assert!(self.width() <= 64, "bus too wide for u64");
        let mut out = 0u64;
        for &bit in &self.bits {
            out = (out << 1) | u64::from(model.val(bit)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_bits() {
        let mut m = Model::new();
        let c = Bus::constant(&mut m, 0b1010, 4);
        let t = m.lit_true();
        assert_eq!(c.bits(), &[t, -t, t, -t]);
    }

    #[test]
    fn rotation_moves_positions() {
        let mut m = Model::new();
        let bus = Bus::new(&mut m, 4);
        let lits = bus.bits().to_vec();
        let rot = bus.rotl(1);
        assert_eq!(rot.bits(), &[lits[1], lits[2], lits[3], lits[0]]);
        assert_eq!(bus.rotr(1).rotl(1), bus);
        assert_eq!(bus.rotl(4), bus);
    }

    #[test]
    fn not_is_free() {
        let mut m = Model::new();
        let bus = Bus::new(&mut m, 3);
        let gates = m.num_constraints();
        let inverted = bus.not();
        assert_eq!(m.num_constraints(), gates);
        assert_eq!(inverted.bit(0), -bus.bit(0));
    }

    #[test]
    #[should_panic]
    fn width_mismatch_is_rejected() {
        let mut m = Model::new();
        let a = Bus::new(&mut m, 3);
        let b = Bus::new(&mut m, 4);
        let _ = a.xor(&mut m, &b);
    }
}
