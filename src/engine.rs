//! 布局引擎：排序、推导比例尺、逐词螺旋搜索放置。
//!
//! 一次布局是一个纯粹的过程：输入快照（单词 + 配置 + 画布）
//! 产出一个不可变的 `LayoutResult`。四叉树和位图缓存都是
//! 本次布局私有的，跨布局不共享任何可变状态。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{Canvas, LayoutConfig, RotationMode, Word};
use crate::mask::ShapeMask;
use crate::raster::{BoxRasterizer, GlyphRasterizer, GlyphSprite, SpriteCache};
use crate::rotation::rotation_for;
use crate::scale::{ColorScale, FontScale};
use crate::spatial::{BBox, QuadTree};
use crate::spiral::Spiral;
use crate::Error;

/// 已放置的单词，坐标是相对画布中心的偏移
#[derive(Debug, Clone)]
pub struct PlacedWord {
    pub text: String,
    pub weight: f32,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub color: String,
}

/// 权重非法被拒收的单词
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedWord {
    pub text: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NegativeWeight,
    NonFiniteWeight,
}

/// 一次布局的完整产出
///
/// `words` 按放置顺序排列（权重大的在前），
/// `dropped_count + words.len()` 等于权重合法的输入单词数。
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub words: Vec<PlacedWord>,
    pub dropped_count: usize,
    pub rejected: Vec<RejectedWord>,
}

/// 协作式取消句柄：新布局请求取代未完成的旧布局
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
    canvas: Canvas,
    seed: Option<u64>,
    rasterizer: Arc<dyn GlyphRasterizer>,
}

impl LayoutEngine {
    /// 配置或画布非法时立即失败，不做任何放置工作
    pub fn new(config: LayoutConfig, canvas: Canvas) -> Result<Self, Error> {
        config.validate()?;
        canvas.validate()?;
        Ok(Self {
            config,
            canvas,
            seed: None,
            rasterizer: Arc::new(BoxRasterizer::new()),
        })
    }

    /// 固定随机种子，使 random / fixed 旋转模式下的布局可复现
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn layout(&self, words: &[Word]) -> Result<LayoutResult, Error> {
        self.layout_with_cancel(words, &CancelFlag::new())
    }

    pub fn layout_with_cancel(
        &self,
        words: &[Word],
        cancel: &CancelFlag,
    ) -> Result<LayoutResult, Error> {
        // 权重非法的单词逐个拒收，其余照常处理
        let mut rejected = Vec::new();
        let mut valid: Vec<Word> = Vec::with_capacity(words.len());
        for word in words {
            if !word.weight.is_finite() {
                warn!("rejecting {:?}: weight is not finite", word.text);
                rejected.push(RejectedWord {
                    text: word.text.clone(),
                    reason: RejectReason::NonFiniteWeight,
                });
            } else if word.weight < 0.0 {
                warn!("rejecting {:?}: weight is negative", word.text);
                rejected.push(RejectedWord {
                    text: word.text.clone(),
                    reason: RejectReason::NegativeWeight,
                });
            } else {
                valid.push(word.clone());
            }
        }

        // 权重从大到小，大字先放最容易成功（贪心打包）；
        // 稳定排序让相同权重保持输入顺序，保证确定性
        valid.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let weights: Vec<f32> = valid.iter().map(|w| w.weight).collect();
        let font_scale = FontScale::derive(
            &weights,
            self.config.min_font_size,
            self.config.max_font_size,
        );
        let mut color_scale = ColorScale::new(self.config.color_theme);

        let mask = ShapeMask::new(self.config.shape, &self.canvas);
        let canvas_bounds = BBox::new(0.0, 0.0, self.canvas.width as f32, self.canvas.height as f32);
        let mut index = QuadTree::new(canvas_bounds);
        let mut cache = SpriteCache::new();
        let mut placed_sprites: Vec<(Arc<GlyphSprite>, (i32, i32))> = Vec::new();

        let (center_x, center_y) = self.canvas.center();
        let mut placed_words = Vec::with_capacity(valid.len());
        let mut dropped_count = 0usize;

        for word in &valid {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let font_size = font_scale.size_for(word.weight);
            let rotation = rotation_for(self.config.rotation_mode, self.config.rotation_angle, &mut rng);
            let sprite = cache.get(
                self.rasterizer.as_ref(),
                &word.text,
                font_size,
                rotation,
                self.config.padding,
            );

            // 光栅化退化为空位图的单词无处可放
            if sprite.is_empty() {
                debug!("dropping {:?}: empty glyph sprite", word.text);
                dropped_count += 1;
                continue;
            }

            // RotationMode::None 不抽旋向，保证无种子时依然确定
            let direction = match self.config.rotation_mode {
                RotationMode::None => 1,
                _ => {
                    if rng.random_bool(0.5) {
                        1
                    } else {
                        -1
                    }
                }
            };

            match self.search_position(&sprite, &mask, &index, &placed_sprites, direction) {
                Some((left, top)) => {
                    let bbox = BBox::new(
                        left as f32,
                        top as f32,
                        left as f32 + sprite.width as f32,
                        top as f32 + sprite.height as f32,
                    );
                    index.insert(placed_sprites.len(), bbox);
                    placed_sprites.push((Arc::clone(&sprite), (left, top)));

                    let x = left as f32 + sprite.width as f32 / 2.0 - center_x;
                    let y = top as f32 + sprite.height as f32 / 2.0 - center_y;
                    debug!(
                        "placed {:?} at ({x:.0}, {y:.0}) size {font_size:.1} rotation {rotation}",
                        word.text
                    );
                    placed_words.push(PlacedWord {
                        text: word.text.clone(),
                        weight: word.weight,
                        font_size,
                        x,
                        y,
                        rotation,
                        color: color_scale.color_for(word.weight).to_owned(),
                    });
                }
                None => {
                    debug!("dropping {:?}: no free position within spiral", word.text);
                    dropped_count += 1;
                }
            }
        }

        Ok(LayoutResult {
            words: placed_words,
            dropped_count,
            rejected,
        })
    }

    /// 单词的螺旋搜索：返回位图左上角的画布坐标
    fn search_position(
        &self,
        sprite: &GlyphSprite,
        mask: &ShapeMask,
        index: &QuadTree,
        placed: &[(Arc<GlyphSprite>, (i32, i32))],
        direction: i32,
    ) -> Option<(i32, i32)> {
        let start_x = self.canvas.width as i32 / 2;
        let start_y = self.canvas.height as i32 / 2;
        let half_w = sprite.width as i32 / 2;
        let half_h = sprite.height as i32 / 2;

        // 螺旋按画布推出的半径界限自然终止，步数上限只是兜底，
        // 不能先于半径界限生效
        let spiral = Spiral::for_shape(self.config.shape, &self.canvas, direction);
        let budget = spiral.step_budget();
        for (dx, dy) in spiral.take(budget) {
            let left = start_x + dx - half_w;
            let top = start_y + dy - half_h;
            let bbox = BBox::new(
                left as f32,
                top as f32,
                left as f32 + sprite.width as f32,
                top as f32 + sprite.height as f32,
            );

            // 粗到细：蒙版 / 画布包含 -> 四叉树粗筛 -> 位图精确相交
            if !mask.contains_box(&bbox) {
                continue;
            }

            let collides = index
                .query(&bbox)
                .into_iter()
                .any(|id| {
                    let (other, other_origin) = &placed[id];
                    sprite.overlaps((left, top), other, *other_origin)
                });
            if !collides {
                return Some((left, top));
            }
        }
        None
    }
}
