//! 权重到字号、权重到颜色的映射。

use crate::config::ColorTheme;

/// 字号比例尺：权重区间线性映射到字号区间
///
/// 所有权重相等（含单词只有一个）时退化为字号区间的中点。
#[derive(Debug, Clone, Copy)]
pub struct FontScale {
    min_weight: f32,
    weight_range: f32,
    min_size: f32,
    size_range: f32,
    mid_size: f32,
}

impl FontScale {
    pub fn derive(weights: &[f32], min_size: f32, max_size: f32) -> Self {
        let min_weight = weights.iter().copied().fold(f32::INFINITY, f32::min);
        let max_weight = weights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Self {
            min_weight,
            weight_range: max_weight - min_weight,
            min_size,
            size_range: max_size - min_size,
            mid_size: (min_size + max_size) / 2.0,
        }
    }

    pub fn size_for(&self, weight: f32) -> f32 {
        if self.weight_range > 0.0 {
            self.min_size + (weight - self.min_weight) / self.weight_range * self.size_range
        } else {
            self.mid_size
        }
    }
}

/// 颜色比例尺：按不同权重的首次出现顺序轮转取调色板
#[derive(Debug)]
pub struct ColorScale {
    palette: &'static [&'static str; 5],
    // 权重按 bit 模式判等，顺序即首次出现顺序
    seen: Vec<u32>,
}

impl ColorScale {
    pub fn new(theme: ColorTheme) -> Self {
        Self {
            palette: theme.palette(),
            seen: Vec::new(),
        }
    }

    pub fn color_for(&mut self, weight: f32) -> &'static str {
        let key = weight.to_bits();
        let index = match self.seen.iter().position(|&k| k == key) {
            Some(i) => i,
            None => {
                self.seen.push(key);
                self.seen.len() - 1
            }
        };
        self.palette[index % self.palette.len()]
    }
}
