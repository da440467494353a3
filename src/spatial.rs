//! 已放置单词包围盒上的四叉树粗筛。
//!
//! 每次布局重建，绝不跨布局复用。查询允许多报、不允许漏报，
//! 精确判定交给位图相交检测。

/// 轴对齐包围盒（画布坐标，y 向下）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    fn contains(&self, other: &BBox) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }
}

// 节点分裂阈值与最大深度
const BUCKET_SIZE: usize = 8;
const MAX_DEPTH: u8 = 6;

#[derive(Debug)]
pub struct QuadTree {
    bounds: BBox,
    depth: u8,
    // 跨子节点边界的条目留在本层
    items: Vec<(usize, BBox)>,
    children: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    pub fn new(bounds: BBox) -> Self {
        Self::with_depth(bounds, 0)
    }

    fn with_depth(bounds: BBox, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    pub fn insert(&mut self, id: usize, bbox: BBox) {
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.bounds.contains(&bbox) {
                    child.insert(id, bbox);
                    return;
                }
            }
            self.items.push((id, bbox));
            return;
        }

        self.items.push((id, bbox));
        if self.items.len() > BUCKET_SIZE && self.depth < MAX_DEPTH {
            self.split();
        }
    }

    fn split(&mut self) {
        let (cx, cy) = self.bounds.center();
        let b = &self.bounds;
        let children = Box::new([
            QuadTree::with_depth(BBox::new(b.left, b.top, cx, cy), self.depth + 1),
            QuadTree::with_depth(BBox::new(cx, b.top, b.right, cy), self.depth + 1),
            QuadTree::with_depth(BBox::new(b.left, cy, cx, b.bottom), self.depth + 1),
            QuadTree::with_depth(BBox::new(cx, cy, b.right, b.bottom), self.depth + 1),
        ]);
        self.children = Some(children);

        let items = std::mem::take(&mut self.items);
        for (id, bbox) in items {
            self.insert(id, bbox);
        }
    }

    /// 返回所有可能与 `bbox` 相交的条目 id
    pub fn query(&self, bbox: &BBox) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect(bbox, &mut out);
        out
    }

    fn collect(&self, bbox: &BBox, out: &mut Vec<usize>) {
        for (id, item) in &self.items {
            if item.intersects(bbox) {
                out.push(*id);
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.bounds.intersects(bbox) {
                    child.collect(bbox, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> QuadTree {
        QuadTree::new(BBox::new(0.0, 0.0, 1000.0, 1000.0))
    }

    #[test]
    fn query_finds_intersecting_boxes() {
        let mut tree = tree();
        tree.insert(0, BBox::new(10.0, 10.0, 50.0, 50.0));
        tree.insert(1, BBox::new(500.0, 500.0, 600.0, 600.0));

        let hits = tree.query(&BBox::new(40.0, 40.0, 60.0, 60.0));
        assert_eq!(hits, vec![0]);

        let hits = tree.query(&BBox::new(700.0, 700.0, 800.0, 800.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn never_under_reports_after_split() {
        let mut tree = tree();
        // 插入远超分裂阈值的条目，布满四个象限
        let mut boxes = Vec::new();
        for i in 0..50 {
            let x = (i % 10) as f32 * 95.0;
            let y = (i / 10) as f32 * 190.0;
            let bbox = BBox::new(x, y, x + 90.0, y + 90.0);
            boxes.push(bbox);
            tree.insert(i, bbox);
        }

        // 对每个已插入的盒子查询，自身必须出现在候选里
        for (i, bbox) in boxes.iter().enumerate() {
            let hits = tree.query(bbox);
            assert!(hits.contains(&i), "box {i} missing from its own query");
        }
    }

    #[test]
    fn boundary_spanning_items_still_reported() {
        let mut tree = tree();
        for i in 0..20 {
            let y = i as f32 * 40.0;
            tree.insert(i, BBox::new(480.0, y, 520.0, y + 30.0));
        }
        // 横跨中线的查询必须拿到所有跨界条目
        let hits = tree.query(&BBox::new(490.0, 0.0, 510.0, 1000.0));
        assert_eq!(hits.len(), 20);
    }
}
