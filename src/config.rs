//! 输入数据与布局配置。
//!
//! 配置在一次布局过程中不可变；任何字段变化都意味着一次全新的布局，
//! 不存在对旧结果的增量修改。

use crate::Error;

/// 单词输入项
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub weight: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, weight: f32) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

/// 预设配色主题，每个主题固定 5 种颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorTheme {
    #[default]
    Blue,
    Red,
    Green,
    Purple,
}

impl ColorTheme {
    pub fn palette(&self) -> &'static [&'static str; 5] {
        match self {
            ColorTheme::Blue => &["#2196F3", "#64B5F6", "#90CAF9", "#1976D2", "#0D47A1"],
            ColorTheme::Red => &["#F44336", "#E57373", "#EF5350", "#D32F2F", "#B71C1C"],
            ColorTheme::Green => &["#4CAF50", "#81C784", "#66BB6A", "#388E3C", "#1B5E20"],
            ColorTheme::Purple => &["#9C27B0", "#BA68C8", "#AB47BC", "#7B1FA2", "#4A148C"],
        }
    }
}

/// 词云整体轮廓
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Circle,
    Rectangle,
    Triangle,
    Star,
}

/// 单词旋转策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationMode {
    /// 全部水平
    #[default]
    None,
    /// ±30° 以内、10° 步进的随机角度
    Random,
    /// 固定角度，正负方向各 50%
    Fixed,
}

/// 布局配置
///
/// `padding` 是每个字形位图向外膨胀的像素数，保证单词之间的最小间距。
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub padding: u32,
    pub color_theme: ColorTheme,
    pub shape: Shape,
    pub rotation_mode: RotationMode,
    /// 仅 `RotationMode::Fixed` 使用
    pub rotation_angle: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_font_size: 20.0,
            max_font_size: 80.0,
            padding: 5,
            color_theme: ColorTheme::Blue,
            shape: Shape::Circle,
            rotation_mode: RotationMode::None,
            rotation_angle: 0.0,
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font_size_range(mut self, min: f32, max: f32) -> Self {
        self.min_font_size = min;
        self.max_font_size = max;
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn color_theme(mut self, theme: ColorTheme) -> Self {
        self.color_theme = theme;
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn rotation_mode(mut self, mode: RotationMode) -> Self {
        self.rotation_mode = mode;
        self
    }

    pub fn rotation_angle(mut self, degrees: f32) -> Self {
        self.rotation_angle = degrees;
        self
    }

    /// 配置校验：任何放置工作开始之前快速失败
    pub fn validate(&self) -> Result<(), Error> {
        if !self.min_font_size.is_finite() || !self.max_font_size.is_finite() {
            return Err(Error::Config("Font sizes must be finite".into()));
        }
        if self.min_font_size <= 0.0 {
            return Err(Error::Config("min_font_size must be positive".into()));
        }
        if self.min_font_size > self.max_font_size {
            return Err(Error::Config(format!(
                "min_font_size ({}) exceeds max_font_size ({})",
                self.min_font_size, self.max_font_size
            )));
        }
        if !self.rotation_angle.is_finite() {
            return Err(Error::Config("rotation_angle must be finite".into()));
        }
        Ok(())
    }
}

/// 画布尺寸，中心点为 `(width/2, height/2)`
#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config("Canvas dimensions must be positive".into()));
        }
        Ok(())
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}
