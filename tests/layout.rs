//! 对公开 API 的端到端布局测试。

use wordcloud_layout::{
    BoxRasterizer, Canvas, ColorTheme, GlyphRasterizer, LayoutConfig, LayoutEngine, PlacedWord,
    RotationMode, Shape, ShapeMask, Word,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn words(entries: &[(&str, f32)]) -> Vec<Word> {
    entries.iter().map(|(t, w)| Word::new(*t, *w)).collect()
}

/// 用同一后端重建位图，得到单词在画布上的包围盒
fn placed_box(word: &PlacedWord, canvas: &Canvas, padding: u32) -> (f32, f32, f32, f32) {
    let sprite = BoxRasterizer::new().rasterize(&word.text, word.font_size, word.rotation, padding);
    let (cx, cy) = canvas.center();
    let left = cx + word.x - sprite.width as f32 / 2.0;
    let top = cy + word.y - sprite.height as f32 / 2.0;
    (
        left,
        top,
        left + sprite.width as f32,
        top + sprite.height as f32,
    )
}

#[test]
fn scenario_data_cloud_word() {
    init_logger();
    let config = LayoutConfig::new()
        .font_size_range(20.0, 80.0)
        .padding(2)
        .shape(Shape::Circle)
        .rotation_mode(RotationMode::None);
    let canvas = Canvas::new(800, 600);
    let engine = LayoutEngine::new(config, canvas).unwrap();

    let result = engine
        .layout(&words(&[("data", 50.0), ("cloud", 30.0), ("word", 30.0)]))
        .unwrap();

    assert_eq!(result.dropped_count, 0);
    assert_eq!(result.words.len(), 3);

    // 权重最大的先放、居中、拿到最大字号
    assert_eq!(result.words[0].text, "data");
    assert_eq!(result.words[0].font_size, 80.0);
    assert!(result.words[0].x.abs() < 5.0 && result.words[0].y.abs() < 5.0);

    // 并列权重 -> 相同的较小字号和相同的颜色
    assert_eq!(result.words[1].font_size, result.words[2].font_size);
    assert!(result.words[1].font_size < result.words[0].font_size);
    assert_eq!(result.words[1].color, result.words[2].color);

    // 颜色按权重首次出现顺序取调色板
    assert_eq!(result.words[0].color, ColorTheme::Blue.palette()[0]);
    assert_eq!(result.words[1].color, ColorTheme::Blue.palette()[1]);

    // 字号范围
    for word in &result.words {
        assert!(word.font_size >= 20.0 && word.font_size <= 80.0);
    }

    // 两两不重叠（无旋转时位图充满包围盒，盒子不相交即位图不相交）
    for i in 0..result.words.len() {
        for j in (i + 1)..result.words.len() {
            let a = placed_box(&result.words[i], &canvas, 2);
            let b = placed_box(&result.words[j], &canvas, 2);
            let disjoint = a.2 <= b.0 || b.2 <= a.0 || a.3 <= b.1 || b.3 <= a.1;
            assert!(
                disjoint,
                "{:?} and {:?} overlap",
                result.words[i].text, result.words[j].text
            );
        }
    }

    // 全部落在圆形蒙版内（半径 0.45 * 600 = 270）
    let (cx, cy) = canvas.center();
    for word in &result.words {
        let (left, top, right, bottom) = placed_box(word, &canvas, 2);
        for (x, y) in [(left, top), (right, top), (left, bottom), (right, bottom)] {
            let dist = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            assert!(dist <= 270.0 + 1.0, "{:?} escapes the circle", word.text);
        }
    }
}

#[test]
fn oversized_words_get_dropped_and_counted() {
    init_logger();
    // 100x100 画布塞不下 200 个 40 号单词
    let config = LayoutConfig::new()
        .font_size_range(40.0, 40.0)
        .padding(1)
        .shape(Shape::Rectangle);
    let engine = LayoutEngine::new(config, Canvas::new(100, 100)).unwrap();

    let input: Vec<Word> = (0..200)
        .map(|i| {
            let ch = char::from(b'a' + (i % 26) as u8);
            Word::new(ch.to_string(), 5.0)
        })
        .collect();
    let result = engine.layout(&input).unwrap();

    assert!(result.dropped_count > 0);
    assert_eq!(result.words.len() + result.dropped_count, 200);
    // 权重全部相等 -> 字号全部取中点
    for word in &result.words {
        assert_eq!(word.font_size, 40.0);
    }
}

#[test]
fn uniform_weights_share_midpoint_size() {
    init_logger();
    let engine = LayoutEngine::new(LayoutConfig::default(), Canvas::default()).unwrap();
    let result = engine
        .layout(&words(&[("one", 3.0), ("two", 3.0), ("three", 3.0)]))
        .unwrap();
    for word in &result.words {
        assert_eq!(word.font_size, 50.0);
    }
}

#[test]
fn identical_seed_reproduces_layout() {
    init_logger();
    let input = words(&[
        ("spring", 40.0),
        ("summer", 35.0),
        ("autumn", 30.0),
        ("winter", 25.0),
        ("rain", 20.0),
        ("snow", 15.0),
    ]);
    let config = LayoutConfig::new().rotation_mode(RotationMode::Random);

    let run = |seed: u64| {
        LayoutEngine::new(config.clone(), Canvas::default())
            .unwrap()
            .seed(seed)
            .layout(&input)
            .unwrap()
    };

    let a = run(99);
    let b = run(99);
    assert_eq!(a.dropped_count, b.dropped_count);
    assert_eq!(a.words.len(), b.words.len());
    for (wa, wb) in a.words.iter().zip(&b.words) {
        assert_eq!(wa.text, wb.text);
        assert_eq!(wa.x, wb.x);
        assert_eq!(wa.y, wb.y);
        assert_eq!(wa.font_size, wb.font_size);
        assert_eq!(wa.rotation, wb.rotation);
        assert_eq!(wa.color, wb.color);
    }
}

#[test]
fn no_rotation_mode_is_deterministic_without_seed() {
    init_logger();
    let input = words(&[("stable", 10.0), ("layout", 5.0), ("pass", 2.0)]);
    let engine = || LayoutEngine::new(LayoutConfig::default(), Canvas::default()).unwrap();

    let a = engine().layout(&input).unwrap();
    let b = engine().layout(&input).unwrap();
    for (wa, wb) in a.words.iter().zip(&b.words) {
        assert_eq!((wa.x, wa.y), (wb.x, wb.y));
        assert_eq!(wa.rotation, 0.0);
    }
}

#[test]
fn drop_accounting_excludes_rejected_weights() {
    init_logger();
    let engine = LayoutEngine::new(LayoutConfig::default(), Canvas::default())
        .unwrap()
        .seed(7);
    let input = vec![
        Word::new("valid", 10.0),
        Word::new("bad", f32::NAN),
        Word::new("fine", 4.0),
        Word::new("worse", -3.0),
    ];
    let result = engine.layout(&input).unwrap();

    assert_eq!(result.rejected.len(), 2);
    assert_eq!(result.words.len() + result.dropped_count, 2);
}

#[test]
fn every_shape_produces_contained_layout() {
    init_logger();
    let canvas = Canvas::new(600, 600);
    for shape in [Shape::Circle, Shape::Rectangle, Shape::Triangle, Shape::Star] {
        let config = LayoutConfig::new()
            .font_size_range(10.0, 24.0)
            .padding(2)
            .shape(shape);
        let engine = LayoutEngine::new(config, canvas).unwrap().seed(3);
        let result = engine
            .layout(&words(&[("sun", 9.0), ("moon", 6.0), ("star", 3.0)]))
            .unwrap();

        assert_eq!(result.words.len() + result.dropped_count, 3);
        let mask = ShapeMask::new(shape, &canvas);
        let (cx, cy) = canvas.center();

        // 放下的必须整体在画布内，且包围盒的角和边都在蒙版里——
        // 凹形状（五角星）只查角是不够的，边可能从凹口穿出
        for word in &result.words {
            let (left, top, right, bottom) = placed_box(word, &canvas, 2);
            assert!(left >= 0.0 && top >= 0.0, "{shape:?}: {:?}", word.text);
            assert!(right <= 600.0 && bottom <= 600.0, "{shape:?}: {:?}", word.text);

            for step in 0..=10 {
                let t = step as f32 / 10.0;
                let x = left + t * (right - left);
                let y = top + t * (bottom - top);
                for (sx, sy) in [(x, top), (x, bottom), (left, y), (right, y)] {
                    assert!(
                        mask.contains(sx - cx, sy - cy),
                        "{shape:?}: {:?} box edge point ({sx}, {sy}) escapes the mask",
                        word.text
                    );
                }
            }
        }
    }
}

#[test]
fn fixed_rotation_uses_configured_angle() {
    init_logger();
    let config = LayoutConfig::new()
        .rotation_mode(RotationMode::Fixed)
        .rotation_angle(30.0);
    let engine = LayoutEngine::new(config, Canvas::default())
        .unwrap()
        .seed(11);
    let result = engine
        .layout(&words(&[("tilt", 5.0), ("lean", 4.0), ("slant", 3.0)]))
        .unwrap();
    for word in &result.words {
        assert_eq!(word.rotation.abs(), 30.0);
    }
}
