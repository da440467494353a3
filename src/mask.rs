//! 形状蒙版：判定一个点（相对画布中心）是否落在允许放置的区域内。
//!
//! 蒙版只约束候选位置，字形位图之间的重叠由碰撞检测负责；
//! 但候选包围盒必须整体位于蒙版内，任何一个角越界即淘汰。

use crate::config::{Canvas, Shape};
use crate::spatial::BBox;

// 各形状相对画布的占比
const CIRCLE_RADIUS_FRACTION: f32 = 0.45;
const RECT_WIDTH_FRACTION: f32 = 0.8;
const RECT_HEIGHT_FRACTION: f32 = 0.6;
const TRIANGLE_SIDE_FRACTION: f32 = 0.8;
const STAR_OUTER_FRACTION: f32 = 0.45;
const STAR_INNER_FRACTION: f32 = 0.2;
const STAR_POINTS: u32 = 5;

#[derive(Debug)]
enum MaskKind {
    Circle { radius: f32 },
    Rect { half_w: f32, half_h: f32 },
    Polygon { vertices: Vec<(f32, f32)> },
}

#[derive(Debug)]
pub struct ShapeMask {
    kind: MaskKind,
    width: f32,
    height: f32,
}

impl ShapeMask {
    pub fn new(shape: Shape, canvas: &Canvas) -> Self {
        let width = canvas.width as f32;
        let height = canvas.height as f32;
        let extent = width.min(height);

        let kind = match shape {
            Shape::Circle => MaskKind::Circle {
                radius: CIRCLE_RADIUS_FRACTION * extent,
            },
            Shape::Rectangle => MaskKind::Rect {
                half_w: RECT_WIDTH_FRACTION * width / 2.0,
                half_h: RECT_HEIGHT_FRACTION * height / 2.0,
            },
            Shape::Triangle => MaskKind::Polygon {
                vertices: triangle_vertices(TRIANGLE_SIDE_FRACTION * extent),
            },
            Shape::Star => MaskKind::Polygon {
                vertices: star_vertices(
                    STAR_OUTER_FRACTION * extent,
                    STAR_INNER_FRACTION * extent,
                ),
            },
        };

        Self {
            kind,
            width,
            height,
        }
    }

    /// 点相对画布中心，落在蒙版内返回 true
    pub fn contains(&self, dx: f32, dy: f32) -> bool {
        match &self.kind {
            MaskKind::Circle { radius } => dx * dx + dy * dy <= radius * radius,
            MaskKind::Rect { half_w, half_h } => dx.abs() <= *half_w && dy.abs() <= *half_h,
            MaskKind::Polygon { vertices } => point_in_polygon(vertices, dx, dy),
        }
    }

    /// 包围盒（画布坐标系）整体位于蒙版内且不越出画布
    ///
    /// 凸形状（圆 / 矩形 / 三角形）查四角即可；凹多边形（五角星）
    /// 四角都在内部时盒边仍可能从凹口穿出，需要额外查盒边与
    /// 多边形边是否相交。
    pub(crate) fn contains_box(&self, bbox: &BBox) -> bool {
        if bbox.left < 0.0 || bbox.top < 0.0 || bbox.right > self.width || bbox.bottom > self.height
        {
            return false;
        }

        let cx = self.width / 2.0;
        let cy = self.height / 2.0;
        let corners = [
            (bbox.left - cx, bbox.top - cy),
            (bbox.right - cx, bbox.top - cy),
            (bbox.left - cx, bbox.bottom - cy),
            (bbox.right - cx, bbox.bottom - cy),
        ];
        if !corners.iter().all(|&(dx, dy)| self.contains(dx, dy)) {
            return false;
        }

        match &self.kind {
            MaskKind::Polygon { vertices } => !box_crosses_boundary(vertices, &corners),
            _ => true,
        }
    }
}

/// 盒边是否与多边形边界相交（四角已确认在内部时，
/// 不相交即整盒都在内部）
fn box_crosses_boundary(vertices: &[(f32, f32)], corners: &[(f32, f32); 4]) -> bool {
    let box_edges = [
        (corners[0], corners[1]),
        (corners[1], corners[3]),
        (corners[3], corners[2]),
        (corners[2], corners[0]),
    ];
    let n = vertices.len();
    for i in 0..n {
        let q1 = vertices[i];
        let q2 = vertices[(i + 1) % n];
        for &(p1, p2) in &box_edges {
            if segments_intersect(p1, p2, q1, q2) {
                return true;
            }
        }
    }
    false
}

fn cross(o: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// 线段相交测试，贴边 / 共线一律按相交处理（宁可误拒候选）
fn segments_intersect(p1: (f32, f32), p2: (f32, f32), q1: (f32, f32), q2: (f32, f32)) -> bool {
    let d1 = cross(p1, p2, q1);
    let d2 = cross(p1, p2, q2);
    let d3 = cross(q1, q2, p1);
    let d4 = cross(q1, q2, p2);
    d1 * d2 <= 0.0 && d3 * d4 <= 0.0
}

/// 等边三角形，顶点朝上，质心在原点（屏幕坐标 y 向下）
fn triangle_vertices(side: f32) -> Vec<(f32, f32)> {
    let height = side * 3f32.sqrt() / 2.0;
    vec![
        (0.0, -height * 2.0 / 3.0),
        (-side / 2.0, height / 3.0),
        (side / 2.0, height / 3.0),
    ]
}

/// 五角星，外顶点朝上，内外顶点交替
fn star_vertices(outer: f32, inner: f32) -> Vec<(f32, f32)> {
    let step = std::f32::consts::PI / STAR_POINTS as f32;
    let mut vertices = Vec::with_capacity(STAR_POINTS as usize * 2);
    for i in 0..STAR_POINTS * 2 {
        let radius = if i % 2 == 0 { outer } else { inner };
        // -90° 起步让第一个外顶点朝上
        let angle = i as f32 * step - std::f32::consts::FRAC_PI_2;
        vertices.push((radius * angle.cos(), radius * angle.sin()));
    }
    vertices
}

/// 射线法（奇偶规则）判断点是否在多边形内
fn point_in_polygon(vertices: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
