//! Factorization of the handshake `pq` value (a product of two 31-bit
//! primes) using Brent's cycle-finding variant of Pollard's rho.

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn sq_mod(x: u128, m: u128) -> u128 {
    // pq fits in 64 bits, so x*x never overflows u128.
    x * x % m
}

fn diff(a: u128, b: u128) -> u128 {
    a.max(b) - a.min(b)
}

/// One run of Brent's rho with the polynomial x² + c. Returns a factor of
/// `n` (possibly `n` itself on a bad cycle, or 1 on failure).
fn brent(n: u128, x0: u128, c: u128) -> u128 {
    let m = 128u128;
    let mut y = x0;
    let mut r = 1u128;
    let mut q = 1u128;
    let mut g = 1u128;
    let mut x = 0u128;
    let mut ys = 0u128;

    while g == 1 {
        x = y;
        for _ in 0..r {
            y = (sq_mod(y, n) + c) % n;
        }
        let mut k = 0u128;
        while k < r && g == 1 {
            ys = y;
            for _ in 0..m.min(r - k) {
                y = (sq_mod(y, n) + c) % n;
                q = q * diff(x, y) % n;
            }
            g = gcd(q, n);
            k += m;
        }
        r <<= 1;
    }

    if g == n {
        // Backtrack one step at a time to recover the factor q hid.
        loop {
            ys = (sq_mod(ys, n) + c) % n;
            g = gcd(diff(x, ys), n);
            if g > 1 {
                break;
            }
        }
    }
    g
}

/// Split `pq` into `(p, q)` with `p <= q`.
///
/// Panics if no factor is found, which cannot happen for the composite
/// values the handshake uses.
pub fn factorize(pq: u64) -> (u64, u64) {
    if pq % 2 == 0 {
        return (2, pq / 2);
    }
    let n = pq as u128;
    for (x0, c) in [(2, 1), (3, 7), (5, 11), (7, 17), (11, 29)] {
        let g = brent(n, x0, c);
        if g > 1 && g < n {
            let (p, q) = (g as u64, (n / g) as u64);
            return (p.min(q), p.max(q));
        }
    }
    panic!("no factor of {pq} found");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_handshake_sample() {
        assert_eq!(factorize(0x17ED48941A08F981), (0x494C553B, 0x53911073));
    }

    #[test]
    fn splits_large_products() {
        assert_eq!(factorize(3057299996188356769), (1533573289, 1993579321));
        assert_eq!(factorize(3351539792903955371), (1613600539, 2077056689));
    }

    #[test]
    fn splits_even_numbers() {
        assert_eq!(factorize(2 * 1533573289), (2, 1533573289));
    }
}
