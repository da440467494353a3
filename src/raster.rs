//! 字形光栅化：把一个单词在给定字号、旋转角下占用的像素
//! 变成按位打包的占用位图，用于精确碰撞检测。
//!
//! 约定：位图只许过覆盖、不许漏覆盖（宁可多占格子也不能让
//! 两个单词在视觉上贴到一起），且对相同输入结果必须可复现。
//! 光栅化失败（空文本、无墨迹字符）退化为空位图，不中断布局。

use std::collections::HashMap;
use std::sync::Arc;

use fontdue::{Font, FontSettings};

use crate::Error;

/// 灰度高于此值的像素视为有墨迹
const INK_THRESHOLD: u8 = 10;

// =============================================================================
// GlyphSprite
// =============================================================================

/// 字形占用位图
///
/// 一行按 32 格打包进 `u32`，格内高位在前（x 越小越靠近 MSB），
/// 一格对应一个像素。`padding` 已在光栅化时膨胀进位图。
#[derive(Debug, Clone)]
pub struct GlyphSprite {
    data: Vec<u32>,
    row_words: usize,
    pub width: u32,
    pub height: u32,
}

impl GlyphSprite {
    fn new(width: u32, height: u32) -> Self {
        let row_words = ((width + 31) >> 5) as usize;
        Self {
            data: vec![0; row_words * height as usize],
            row_words,
            width,
            height,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            row_words: 0,
            width: 0,
            height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn has_ink(&self) -> bool {
        self.data.iter().any(|&word| word != 0)
    }

    fn set(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
            let row = y as usize * self.row_words;
            let col = (x as usize) >> 5;
            let bit = 31 - (x & 31);
            self.data[row + col] |= 1 << bit;
        }
    }

    fn fill_all(&mut self) {
        for word in &mut self.data {
            *word = u32::MAX;
        }
        self.clear_row_tails();
    }

    // 行尾超出 width 的位必须保持为 0，row_window 依赖这一点
    fn clear_row_tails(&mut self) {
        let tail = self.width & 31;
        if tail == 0 || self.row_words == 0 {
            return;
        }
        let keep = !(u32::MAX >> tail);
        for y in 0..self.height as usize {
            self.data[y * self.row_words + self.row_words - 1] &= keep;
        }
    }

    #[cfg(test)]
    fn bit(&self, x: u32, y: u32) -> bool {
        let row = y as usize * self.row_words;
        let col = (x as usize) >> 5;
        let bit = 31 - (x & 31) as u32;
        self.data[row + col] & (1 << bit) != 0
    }

    /// 取第 `y` 行从局部坐标 `x` 起的 32 个格子（不足补 0）
    fn row_window(&self, y: u32, x: i32) -> u32 {
        debug_assert!(x >= 0);
        let x = x as usize;
        if y >= self.height || x >= self.width as usize {
            return 0;
        }
        let row = y as usize * self.row_words;
        let word = x >> 5;
        let shift = (x & 31) as u32;
        let hi = self.data[row + word];
        if shift == 0 {
            return hi;
        }
        let lo = if word + 1 < self.row_words {
            self.data[row + word + 1]
        } else {
            0
        };
        (hi << shift) | (lo >> (32 - shift))
    }

    /// 两张位图在各自画布原点（左上角）下是否存在墨迹重叠
    ///
    /// 逐行做移位对齐后的按位与，一次比较 32 格。
    pub fn overlaps(
        &self,
        origin: (i32, i32),
        other: &GlyphSprite,
        other_origin: (i32, i32),
    ) -> bool {
        let left = origin.0.max(other_origin.0);
        let top = origin.1.max(other_origin.1);
        let right = (origin.0 + self.width as i32).min(other_origin.0 + other.width as i32);
        let bottom = (origin.1 + self.height as i32).min(other_origin.1 + other.height as i32);
        if left >= right || top >= bottom {
            return false;
        }

        for y in top..bottom {
            let my_y = (y - origin.1) as u32;
            let other_y = (y - other_origin.1) as u32;
            let mut x = left;
            while x < right {
                let mine = self.row_window(my_y, x - origin.0);
                let theirs = other.row_window(other_y, x - other_origin.0);
                // 末段不足 32 格时屏蔽窗口尾部
                let span = (right - x).min(32) as u32;
                let keep = if span == 32 {
                    u32::MAX
                } else {
                    !(u32::MAX >> span)
                };
                if mine & theirs & keep != 0 {
                    return true;
                }
                x += 32;
            }
        }
        false
    }
}

// =============================================================================
// Rasterizer Backends
// =============================================================================

/// 光栅化后端
///
/// 实现必须满足两条契约：结果对相同 (text, size, rotation, padding)
/// 可复现；占用格子只许高估不许低估。
pub trait GlyphRasterizer: Send + Sync {
    fn rasterize(&self, text: &str, font_size: f32, rotation_degrees: f32, padding: u32)
        -> GlyphSprite;
}

/// 未旋转内容矩形到旋转后位图的公共变换
struct SpriteFrame {
    sin: f32,
    cos: f32,
    cx: f32,
    cy: f32,
    min_x: f32,
    min_y: f32,
    width: u32,
    height: u32,
    pad: f32,
    dilate: i32,
}

impl SpriteFrame {
    fn new(content_w: f32, content_h: f32, rotation_degrees: f32, padding: u32) -> Self {
        let pad = padding as f32;
        let w = content_w.ceil() + pad * 2.0;
        let h = content_h.ceil() + pad * 2.0;
        let cx = w / 2.0;
        let cy = h / 2.0;

        let rad = rotation_degrees.to_radians();
        let (sin, cos) = rad.sin_cos();

        let rotate = |x: f32, y: f32| -> (f32, f32) {
            let dx = x - cx;
            let dy = y - cy;
            (dx * cos - dy * sin + cx, dx * sin + dy * cos + cy)
        };

        // 旋转后的新包围盒
        let corners = [
            rotate(0.0, 0.0),
            rotate(w, 0.0),
            rotate(0.0, h),
            rotate(w, h),
        ];
        let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
        let max_x = corners
            .iter()
            .map(|p| p.0)
            .fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = corners
            .iter()
            .map(|p| p.1)
            .fold(f32::NEG_INFINITY, f32::max);

        // 旋转重采样会在目标网格上留缝，多膨胀一格补上
        let dilate = if rotation_degrees % 360.0 == 0.0 {
            padding as i32
        } else {
            padding as i32 + 1
        };

        Self {
            sin,
            cos,
            cx,
            cy,
            min_x,
            min_y,
            width: (max_x - min_x).ceil() as u32,
            height: (max_y - min_y).ceil() as u32,
            pad,
            dilate,
        }
    }

    fn blank_sprite(&self) -> GlyphSprite {
        GlyphSprite::new(self.width, self.height)
    }

    /// 把未旋转坐标系下的一个墨迹像素盖到位图上（带膨胀）
    fn stamp(&self, sprite: &mut GlyphSprite, x: f32, y: f32) {
        let dx = x - self.cx;
        let dy = y - self.cy;
        let rx = dx * self.cos - dy * self.sin + self.cx;
        let ry = dx * self.sin + dy * self.cos + self.cy;

        let fx = (rx - self.min_x).round() as i32;
        let fy = (ry - self.min_y).round() as i32;
        for py in -self.dilate..=self.dilate {
            for px in -self.dilate..=self.dilate {
                sprite.set(fx + px, fy + py);
            }
        }
    }
}

/// 基于 fontdue 的真实字形后端，调用方提供字体数据
pub struct FontRasterizer {
    font: Font,
}

impl FontRasterizer {
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| Error::Font(e.to_string()))?;
        Ok(Self { font })
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(
        &self,
        text: &str,
        font_size: f32,
        rotation_degrees: f32,
        padding: u32,
    ) -> GlyphSprite {
        if text.trim().is_empty() {
            return GlyphSprite::empty();
        }

        let metrics = self
            .font
            .horizontal_line_metrics(font_size)
            .unwrap_or(fontdue::LineMetrics {
                ascent: font_size * 0.8,
                descent: font_size * -0.2,
                line_gap: 0.0,
                new_line_size: font_size,
            });

        let mut glyphs = Vec::new();
        let mut total_width = 0.0f32;
        for ch in text.chars() {
            let (glyph_metrics, bitmap) = self.font.rasterize(ch, font_size);
            glyphs.push((total_width, glyph_metrics, bitmap));
            total_width += glyph_metrics.advance_width;
        }

        let frame = SpriteFrame::new(total_width, metrics.new_line_size, rotation_degrees, padding);
        let mut sprite = frame.blank_sprite();
        let base_y = frame.pad + metrics.ascent;

        for (offset_x, glyph_metrics, bitmap) in &glyphs {
            let char_left = frame.pad + offset_x + glyph_metrics.xmin as f32;
            let char_top = base_y - glyph_metrics.height as f32 - glyph_metrics.ymin as f32;

            for y in 0..glyph_metrics.height {
                for x in 0..glyph_metrics.width {
                    if bitmap[y * glyph_metrics.width + x] > INK_THRESHOLD {
                        frame.stamp(&mut sprite, char_left + x as f32, char_top + y as f32);
                    }
                }
            }
        }

        // 整串字符都没有墨迹（如全空格）按光栅化失败处理
        if !sprite.has_ink() {
            return GlyphSprite::empty();
        }
        sprite
    }
}

/// 无字体文件的保守后端：把每个字符当作实心矩形
///
/// 对任何真实字体的同尺寸文本都是过覆盖，作为默认后端和测试后端使用。
pub struct BoxRasterizer {
    pub ascii_advance: f32,
    pub wide_advance: f32,
    pub line_height: f32,
}

impl Default for BoxRasterizer {
    fn default() -> Self {
        Self {
            ascii_advance: 0.6,
            wide_advance: 1.0,
            line_height: 1.2,
        }
    }
}

impl BoxRasterizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlyphRasterizer for BoxRasterizer {
    fn rasterize(
        &self,
        text: &str,
        font_size: f32,
        rotation_degrees: f32,
        padding: u32,
    ) -> GlyphSprite {
        if text.trim().is_empty() {
            return GlyphSprite::empty();
        }

        let content_w: f32 = text
            .chars()
            .map(|ch| {
                if ch.is_ascii() {
                    self.ascii_advance * font_size
                } else {
                    self.wide_advance * font_size
                }
            })
            .sum();
        let content_h = self.line_height * font_size;

        let frame = SpriteFrame::new(content_w, content_h, rotation_degrees, padding);
        let mut sprite = frame.blank_sprite();

        if rotation_degrees % 360.0 == 0.0 {
            // 未旋转时位图就是整个（含 padding 的）包围盒
            sprite.fill_all();
            return sprite;
        }

        let w = content_w.ceil() as i32;
        let h = content_h.ceil() as i32;
        for y in 0..h {
            for x in 0..w {
                frame.stamp(
                    &mut sprite,
                    frame.pad + x as f32 + 0.5,
                    frame.pad + y as f32 + 0.5,
                );
            }
        }
        sprite
    }
}

// =============================================================================
// Sprite Cache
// =============================================================================

#[derive(Debug, PartialEq, Eq, Hash)]
struct SpriteKey {
    text: String,
    size_bits: u32,
    rotation_bits: u32,
    padding: u32,
}

/// 位图缓存，作用域限定在单次布局内
pub(crate) struct SpriteCache {
    entries: HashMap<SpriteKey, Arc<GlyphSprite>>,
}

impl SpriteCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get(
        &mut self,
        rasterizer: &dyn GlyphRasterizer,
        text: &str,
        font_size: f32,
        rotation_degrees: f32,
        padding: u32,
    ) -> Arc<GlyphSprite> {
        let key = SpriteKey {
            text: text.to_owned(),
            size_bits: font_size.to_bits(),
            rotation_bits: rotation_degrees.to_bits(),
            padding,
        };
        Arc::clone(self.entries.entry(key).or_insert_with(|| {
            Arc::new(rasterizer.rasterize(text, font_size, rotation_degrees, padding))
        }))
    }
}
