// src/math/full_math.rs

use crate::error::{CreditError, Result};

// Isolés dans leur propre module : le code généré par la macro écrit
// `Result<Self, Self::Err>` et ne doit pas voir l'alias `error::Result`.
mod uints {
    use uint::construct_uint;

    construct_uint! { pub struct U256(4); }
    construct_uint! { pub struct U512(8); }
    construct_uint! { pub struct U768(12); }
}

pub use uints::{U256, U512, U768};

pub trait MulDiv<RHS = Self> {
    type Output;
    fn mul_div_floor(self, num: RHS, denom: RHS) -> Option<Self::Output>;
    fn mul_div_ceil(self, num: RHS, denom: RHS) -> Option<Self::Output>;
}

// Conversions internes entre largeurs, pour garder le code propre
trait Upcast<T> { fn as_up(self) -> T; }
trait Downcast<T> { fn as_down(self) -> T; }

impl Upcast<U512> for U256 { fn as_up(self) -> U512 { U512([self.0[0], self.0[1], self.0[2], self.0[3], 0, 0, 0, 0]) } }
impl Downcast<U256> for U512 { fn as_down(self) -> U256 { U256([self.0[0], self.0[1], self.0[2], self.0[3]]) } }
impl Upcast<U768> for U512 {
    fn as_up(self) -> U768 {
        let mut words = [0u64; 12];
        words[..8].copy_from_slice(&self.0);
        U768(words)
    }
}
impl Downcast<U512> for U768 {
    fn as_down(self) -> U512 {
        let mut words = [0u64; 8];
        words.copy_from_slice(&self.0[..8]);
        U512(words)
    }
}

impl MulDiv for U256 {
    type Output = U256;
    fn mul_div_floor(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom.is_zero() { return None; }
        let r = (self.as_up() * num.as_up()) / denom.as_up();
        if r > U256::MAX.as_up() { None } else { Some(r.as_down()) }
    }
    fn mul_div_ceil(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom.is_zero() { return None; }
        let r = (self.as_up() * num.as_up() + (denom - U256::one()).as_up()) / denom.as_up();
        if r > U256::MAX.as_up() { None } else { Some(r.as_down()) }
    }
}

/// `floor(a * b / denominator)` avec un intermédiaire de 512 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(CreditError::DivisionByZero);
    }
    a.mul_div_floor(b, denominator).ok_or(CreditError::ArithmeticOverflow)
}

/// `ceil(a * b / denominator)`. Réservé aux montants dus au protocole ou à une contrepartie.
pub fn mul_div_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(CreditError::DivisionByZero);
    }
    a.mul_div_ceil(b, denominator).ok_or(CreditError::ArithmeticOverflow)
}

/// `ceil(a / b)`.
pub fn div_up(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(CreditError::DivisionByZero);
    }
    let quotient = a / b;
    // reste non nul => b >= 2, donc quotient + 1 ne déborde pas
    if (a % b).is_zero() { Ok(quotient) } else { Ok(quotient + U256::one()) }
}

/// Racine carrée entière arrondie à l'inférieur (méthode babylonienne).
pub fn sqrt(y: U256) -> U256 {
    let two = U256::from(2u8);
    if y > U256::from(3u8) {
        let mut z = y;
        let mut x = y / two + U256::one();
        while x < z {
            z = x;
            x = (y / x + x) / two;
        }
        z
    } else if !y.is_zero() {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Racine carrée entière arrondie au supérieur.
pub fn sqrt_up(y: U256) -> U256 {
    let z = sqrt(y);
    // z <= 2^128 - 1 : ni z * z ni z + 1 ne débordent
    if z * z == y { z } else { z + U256::one() }
}

/// Décalage à droite de `n` bits, arrondi vers +infini.
pub fn shift_right_up(x: U256, n: u32) -> U256 {
    if n >= 256 {
        return if x.is_zero() { U256::zero() } else { U256::one() };
    }
    let shift = n as usize;
    let z = x >> shift;
    if (z << shift) != x { z + U256::one() } else { z }
}

/// `ceil(a * b * c / denominator)` avec un intermédiaire de 768 bits, résultat sur 512 bits.
pub fn mul3_div_up(a: U256, b: U256, c: U256, denominator: U256) -> Result<U512> {
    if denominator.is_zero() {
        return Err(CreditError::DivisionByZero);
    }
    let d: U768 = denominator.as_up().as_up();
    // a * b * c < 2^768 - 2^257 : ajouter d - 1 ne déborde pas
    let q = (product3(a, b, c) + d - U768::one()) / d;
    if q > U512::MAX.as_up() {
        return Err(CreditError::ArithmeticOverflow);
    }
    Ok(q.as_down())
}

/// Racine carrée arrondie au supérieur d'une valeur 512 bits, ramenée sur 256 bits.
pub fn sqrt_up_wide(y: U512) -> Result<U256> {
    let two = U512::from(2u8);
    let root = if y > U512::from(3u8) {
        let mut z = y;
        let mut x = y / two + U512::one();
        while x < z {
            z = x;
            x = (y / x + x) / two;
        }
        z
    } else if !y.is_zero() {
        U512::one()
    } else {
        U512::zero()
    };
    // root < 2^256 : root * root et root + 1 tiennent dans 512 bits
    let up = if root * root == y { root } else { root + U512::one() };
    if up > U256::MAX.as_up() {
        return Err(CreditError::ArithmeticOverflow);
    }
    Ok(up.as_down())
}

pub fn checked_mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(CreditError::ArithmeticOverflow)
}

pub fn checked_add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b).ok_or(CreditError::ArithmeticOverflow)
}

pub fn checked_sub(a: U256, b: U256) -> Result<U256> {
    a.checked_sub(b).ok_or(CreditError::ArithmeticOverflow)
}

/// Produit exact de deux valeurs 256 bits, pour les comparaisons.
pub fn wide_mul(a: U256, b: U256) -> U512 {
    a.as_up() * b.as_up()
}

/// Produit exact de trois valeurs 256 bits (x * y * z ne peut pas déborder 768 bits).
pub fn product3(a: U256, b: U256, c: U256) -> U768 {
    let ab: U768 = wide_mul(a, b).as_up();
    let c: U768 = c.as_up().as_up();
    ab * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn u(v: u128) -> U256 {
        U256::from(v)
    }

    fn any_u256() -> impl Strategy<Value = U256> {
        any::<[u64; 4]>().prop_map(U256)
    }

    #[test]
    fn mul_div_rounds_down_and_up() {
        assert_eq!(mul_div(u(7), u(3), u(2)).unwrap(), u(10));
        assert_eq!(mul_div_up(u(7), u(3), u(2)).unwrap(), u(11));
        assert_eq!(mul_div(u(8), u(3), u(2)).unwrap(), u(12));
        assert_eq!(mul_div_up(u(8), u(3), u(2)).unwrap(), u(12));
    }

    #[test]
    fn mul_div_uses_a_double_width_intermediate() {
        // MAX * MAX tient dans 512 bits ; le quotient retombe dans 256 bits.
        assert_eq!(mul_div(U256::MAX, U256::MAX, U256::MAX).unwrap(), U256::MAX);
        assert_eq!(mul_div_up(U256::MAX, U256::MAX, U256::MAX).unwrap(), U256::MAX);
        assert_eq!(mul_div(U256::MAX, u(2), u(1)), Err(CreditError::ArithmeticOverflow));
        assert_eq!(mul_div_up(U256::MAX, U256::MAX, U256::MAX - U256::one()), Err(CreditError::ArithmeticOverflow));
    }

    #[test]
    fn zero_denominators_are_reported() {
        assert_eq!(mul_div(u(1), u(1), U256::zero()), Err(CreditError::DivisionByZero));
        assert_eq!(mul_div_up(u(1), u(1), U256::zero()), Err(CreditError::DivisionByZero));
        assert_eq!(div_up(u(1), U256::zero()), Err(CreditError::DivisionByZero));
    }

    #[test]
    fn div_up_only_rounds_on_a_remainder() {
        assert_eq!(div_up(u(10), u(5)).unwrap(), u(2));
        assert_eq!(div_up(u(11), u(5)).unwrap(), u(3));
        assert_eq!(div_up(U256::zero(), u(5)).unwrap(), U256::zero());
        assert_eq!(div_up(U256::MAX, u(2)).unwrap(), (U256::MAX >> 1usize) + U256::one());
    }

    #[test]
    fn sqrt_small_values() {
        let floors = [0u128, 1, 1, 1, 2, 2, 2, 2, 2, 3];
        for (n, expected) in floors.iter().enumerate() {
            assert_eq!(sqrt(u(n as u128)), u(*expected), "sqrt({n})");
        }
        assert_eq!(sqrt_up(U256::zero()), U256::zero());
        assert_eq!(sqrt_up(u(1)), u(1));
        assert_eq!(sqrt_up(u(2)), u(2));
        assert_eq!(sqrt_up(u(4)), u(2));
        assert_eq!(sqrt_up(u(5)), u(3));
    }

    #[test]
    fn sqrt_of_max_value() {
        let root = sqrt(U256::MAX);
        assert_eq!(root, U256::from(u128::MAX));
        assert_eq!(sqrt_up(U256::MAX), U256::from(u128::MAX) + U256::one());
    }

    #[test]
    fn generated_parsers_work_beside_the_error_alias() {
        assert_eq!(U256::from_str_radix("1000000", 10).unwrap(), u(1_000_000));
        assert_eq!(U256::from_str_radix("ff", 16).unwrap(), u(255));
        assert_eq!(U512::from_dec_str("42").unwrap(), U512::from(42u8));
        assert!(U768::from_dec_str("abc").is_err());
    }

    #[test]
    fn wide_square_roots_go_past_128_bit_operands() {
        let big = U256::one() << 200usize;
        // (2^200)^2 * 3 / 3 : le carré ne tient pas sur 256 bits.
        let squared = mul3_div_up(big, big, u(3), u(3)).unwrap();
        assert_eq!(squared, U512::one() << 400usize);
        assert_eq!(sqrt_up_wide(squared).unwrap(), big);
        assert_eq!(sqrt_up_wide(squared + U512::one()).unwrap(), big + U256::one());
        assert_eq!(mul3_div_up(u(7), u(1), u(1), u(2)).unwrap(), U512::from(4u8));
        assert_eq!(mul3_div_up(u(1), u(1), u(1), U256::zero()), Err(CreditError::DivisionByZero));
        assert_eq!(mul3_div_up(U256::MAX, U256::MAX, U256::MAX, u(1)), Err(CreditError::ArithmeticOverflow));
        assert_eq!(sqrt_up_wide(U512::MAX), Err(CreditError::ArithmeticOverflow));
    }

    #[test]
    fn shift_right_up_adds_one_for_lost_bits() {
        assert_eq!(shift_right_up(u(32), 4), u(2));
        assert_eq!(shift_right_up(u(33), 4), u(3));
        assert_eq!(shift_right_up(u(15), 4), u(1));
        assert_eq!(shift_right_up(U256::zero(), 31), U256::zero());
        assert_eq!(shift_right_up(U256::MAX, 255), u(2));
        assert_eq!(shift_right_up(U256::MAX, 256), u(1));
    }

    #[test]
    fn full_magnitude_inputs_are_exact_or_rejected() {
        let x = U256::from_dec_str("500000000000000000000000000").unwrap();
        let y = U256::from_dec_str("340282366920938463463374607431768211455").unwrap();
        let z = U256::from_dec_str("1000000000000000000000000000000").unwrap();

        // x * y dépasse 128 bits mais tient dans 256 bits : résultat exact
        let xy = checked_mul(x, y).unwrap();
        assert_eq!(mul_div(xy, z, z).unwrap(), xy);
        assert_eq!(mul_div(x, y, y).unwrap(), x);
        // x * y * z dépasse 256 bits : la multiplication simple est refusée...
        assert_eq!(checked_mul(xy, z), Err(CreditError::ArithmeticOverflow));
        // ...mais le produit large reste exact
        let p = product3(x, y, z);
        let expected: U768 = wide_mul(xy, z).as_up();
        assert_eq!(p, expected);
        assert_eq!(checked_sub(x, y), Err(CreditError::ArithmeticOverflow));
        assert_eq!(checked_add(U256::MAX, U256::one()), Err(CreditError::ArithmeticOverflow));
    }

    proptest! {
        #[test]
        fn mul_div_up_is_floor_plus_remainder_flag(a in any::<u128>(), b in any::<u128>(), d in 1u128..) {
            let (a, b, d) = (u(a), u(b), u(d));
            let floor = mul_div(a, b, d).unwrap();
            let ceil = mul_div_up(a, b, d).unwrap();
            let exact = (a * b) % d == U256::zero();
            if exact {
                prop_assert_eq!(ceil, floor);
            } else {
                prop_assert_eq!(ceil, floor + U256::one());
            }
        }

        #[test]
        fn sqrt_brackets_its_input(n in any_u256()) {
            let root = sqrt(n);
            let next = root + U256::one();
            prop_assert!(wide_mul(root, root) <= n.as_up());
            prop_assert!(wide_mul(next, next) > n.as_up());

            let up = sqrt_up(n);
            prop_assert!(wide_mul(up, up) >= n.as_up());
            if wide_mul(root, root) == n.as_up() {
                prop_assert_eq!(up, root);
            } else {
                prop_assert_eq!(up, next);
            }
        }

        #[test]
        fn wide_sqrt_agrees_with_the_narrow_one(n in any_u256()) {
            prop_assert_eq!(sqrt_up_wide(n.as_up()).unwrap(), sqrt_up(n));
        }

        #[test]
        fn shift_right_up_matches_div_up(x in any_u256(), n in 0u32..255) {
            let divisor = U256::one() << (n as usize);
            prop_assert_eq!(shift_right_up(x, n), div_up(x, divisor).unwrap());
        }

        #[test]
        fn wide_mul_div_is_never_silently_truncated(a in any_u256(), b in any_u256(), d in any_u256()) {
            prop_assume!(!d.is_zero());
            let exact = wide_mul(a, b) / d.as_up();
            match mul_div(a, b, d) {
                Ok(q) => prop_assert_eq!(q.as_up(), exact),
                Err(e) => {
                    prop_assert_eq!(e, CreditError::ArithmeticOverflow);
                    prop_assert!(exact > U256::MAX.as_up());
                }
            }
        }
    }
}
