//! 单词旋转角的选取。
//!
//! 每个单词在放置时刻抽取一次，不跨单词复用。

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::RotationMode;

pub fn rotation_for(mode: RotationMode, fixed_angle: f32, rng: &mut ChaCha8Rng) -> f32 {
    match mode {
        RotationMode::None => 0.0,
        // ±30° 以内的 10° 倍数
        RotationMode::Random => (rng.random_range(-3i32..=3) * 10) as f32,
        RotationMode::Fixed => {
            if rng.random_bool(0.5) {
                fixed_angle
            } else {
                -fixed_angle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn none_is_always_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(rotation_for(RotationMode::None, 45.0, &mut rng), 0.0);
        }
    }

    #[test]
    fn random_stays_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..200 {
            let angle = rotation_for(RotationMode::Random, 0.0, &mut rng);
            assert!(angle.abs() <= 30.0);
            assert_eq!(angle % 10.0, 0.0);
        }
    }

    #[test]
    fn fixed_picks_either_sign() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen_positive = false;
        let mut seen_negative = false;
        for _ in 0..100 {
            let angle = rotation_for(RotationMode::Fixed, 45.0, &mut rng);
            assert_eq!(angle.abs(), 45.0);
            seen_positive |= angle > 0.0;
            seen_negative |= angle < 0.0;
        }
        assert!(seen_positive && seen_negative);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(
                rotation_for(RotationMode::Random, 0.0, &mut a),
                rotation_for(RotationMode::Random, 0.0, &mut b)
            );
        }
    }
}
