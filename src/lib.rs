/*!
 * WordCloud Layout Engine
 *
 * 一个纯 Rust 实现的词云布局引擎。
 *
 * 输入带权重的单词列表和配置，输出每个单词的具体摆放
 * （位置、字号、旋转角、颜色），渲染交给调用方。
 *
 * 核心算法：
 * - 按权重线性插值计算字号，权重从大到小依次放置
 * - 从画布中心沿螺旋线向外搜索候选位置
 * - 形状蒙版（圆形 / 矩形 / 三角形 / 五角星）约束可放置区域
 * - 四叉树粗筛 + 位图精确相交判定，保证零重叠
 * - 放不下的单词直接丢弃并计数（词云的标准行为）
 */

use thiserror::Error;

mod config;
mod engine;
mod mask;
mod raster;
mod rotation;
mod scale;
mod session;
mod spatial;
mod spiral;

pub use config::{Canvas, ColorTheme, LayoutConfig, RotationMode, Shape, Word};
pub use engine::{CancelFlag, LayoutEngine, LayoutResult, PlacedWord, RejectReason, RejectedWord};
pub use mask::ShapeMask;
pub use raster::{BoxRasterizer, FontRasterizer, GlyphRasterizer, GlyphSprite};
pub use session::{LayoutOutcome, LayoutSession};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Layout pass cancelled")]
    Cancelled,
}

/// 一步到位：默认配置 + 默认画布，直接布局
pub fn layout(words: &[(&str, f32)]) -> Result<LayoutResult, Error> {
    let inputs: Vec<Word> = words
        .iter()
        .map(|(text, weight)| Word::new(*text, *weight))
        .collect();

    LayoutEngine::new(LayoutConfig::default(), Canvas::default())?.layout(&inputs)
}
