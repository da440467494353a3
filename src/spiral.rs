//! 从画布中心向外扩张的螺旋搜索路径。
//!
//! 矩形词云配矩形扩张螺旋，其余形状配阿基米德螺旋——只是让
//! 搜索路径贴合轮廓、更快命中，不影响正确性。螺旋超过由画布
//! 尺寸推出的最大半径后终止，对应单词被丢弃。

use crate::config::{Canvas, Shape};

/// 每步半径增量（阿基米德螺旋 r = a·θ 的采样步长）
const RADIUS_STEP: f64 = 0.1;

pub enum Spiral {
    Archimedean(ArchimedeanSpiral),
    Rectangular(RectangularSpiral),
}

impl Spiral {
    /// `direction` 取 ±1，决定螺旋的旋向
    pub fn for_shape(shape: Shape, canvas: &Canvas, direction: i32) -> Self {
        match shape {
            Shape::Rectangle => {
                Spiral::Rectangular(RectangularSpiral::new(canvas, direction))
            }
            _ => Spiral::Archimedean(ArchimedeanSpiral::new(canvas, direction)),
        }
    }

    /// 步数保险上限，由画布尺寸推出
    ///
    /// 两种螺旋都会按自己的半径界限终止，这里只是兜底；
    /// 上限必须不小于自然终止所需的步数，否则会在大画布上
    /// 悄悄缩小搜索范围。
    pub fn step_budget(&self) -> usize {
        match self {
            Spiral::Archimedean(s) => (s.max_radius / RADIUS_STEP) as usize + 2,
            Spiral::Rectangular(s) => {
                // 第 k 圈走 ~8k 步，K 圈合计 ~4K² 步，再留一倍余量
                let revolutions_x = (s.max_x / s.step_x) as usize + 2;
                let revolutions_y = (s.max_y / s.step_y) as usize + 2;
                let revolutions = revolutions_x.max(revolutions_y);
                8 * revolutions * revolutions + 16
            }
        }
    }
}

impl Iterator for Spiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Spiral::Archimedean(s) => s.next(),
            Spiral::Rectangular(s) => s.next(),
        }
    }
}

/// 阿基米德螺旋，按画布宽高比在 x 方向拉伸
pub struct ArchimedeanSpiral {
    step: i64,
    direction: i64,
    aspect: f64,
    max_radius: f64,
}

impl ArchimedeanSpiral {
    fn new(canvas: &Canvas, direction: i32) -> Self {
        let width = canvas.width as f64;
        let height = canvas.height as f64;
        Self {
            step: 0,
            direction: if direction < 0 { -1 } else { 1 },
            aspect: width / height,
            // 画布对角线的一半，再远不可能有合法位置
            max_radius: (width * width + height * height).sqrt() / 2.0,
        }
    }
}

impl Iterator for ArchimedeanSpiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.step += self.direction;
        let t = self.step as f64 * RADIUS_STEP;
        if t.abs() > self.max_radius {
            return None;
        }
        let x = self.aspect * t * t.cos();
        let y = t * t.sin();
        Some((x as i32, y as i32))
    }
}

/// 矩形扩张螺旋：绕中心一圈圈走矩形框
pub struct RectangularSpiral {
    t: i64,
    direction: i64,
    dx: f64,
    dy: f64,
    step_x: f64,
    step_y: f64,
    max_x: f64,
    max_y: f64,
}

impl RectangularSpiral {
    fn new(canvas: &Canvas, direction: i32) -> Self {
        let step_y = 4.0;
        Self {
            t: 0,
            direction: if direction < 0 { -1 } else { 1 },
            dx: 0.0,
            dy: 0.0,
            step_x: step_y * canvas.width as f64 / canvas.height as f64,
            step_y,
            max_x: canvas.width as f64 / 2.0,
            max_y: canvas.height as f64 / 2.0,
        }
    }
}

impl Iterator for RectangularSpiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.t += self.direction;
        let sign = if self.t < 0 { -1.0 } else { 1.0 };
        let phase = ((1.0 + 4.0 * sign * self.t as f64).sqrt() - sign) as i64 & 3;
        match phase {
            0 => self.dx += self.step_x,
            1 => self.dy += self.step_y,
            2 => self.dx -= self.step_x,
            _ => self.dy -= self.step_y,
        }
        // 两个方向都走出画布后不会再有合法位置
        if self.dx.abs() > self.max_x + self.step_x && self.dy.abs() > self.max_y + self.step_y {
            return None;
        }
        Some((self.dx as i32, self.dy as i32))
    }
}
