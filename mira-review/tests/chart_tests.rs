//! Chart rendering properties

use mira_review::astro::{parse_chart, HouseChart, House};
use mira_review::chart::{ChartConfig, ChartRenderer};
use serde_json::json;

fn populated(house: usize) -> HouseChart {
    let mut chart = HouseChart::default();
    chart.houses[house - 1] = House {
        sign: Some("Sagittarius".to_string()),
        planets: vec![
            "Sun".to_string(),
            "Moon".to_string(),
            "Mars".to_string(),
            "Rahu".to_string(),
        ],
    };
    chart
}

#[test]
fn test_png_is_deterministic() {
    let payload = json!({
        "houses": {
            "house_1": {"sign": "Leo", "planets": ["Sun", "Venus"]},
            "house_7": {"sign": "Aquarius", "planets": ["Saturn"]}
        }
    });
    let chart = parse_chart(&payload);
    let renderer = ChartRenderer::default();

    let first = renderer.render_png(&chart).unwrap();
    let second = renderer.render_png(&chart).unwrap();

    assert_eq!(first, second);
    assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_one_house_changes_only_its_label_rect() {
    let renderer = ChartRenderer::default();
    let empty = renderer.render(&HouseChart::default());

    for house in 1..=12 {
        let rect = renderer.label_rect(house).unwrap();
        let image = renderer.render(&populated(house));
        let mut changed = 0;

        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel != empty.get_pixel(x, y) {
                changed += 1;
                assert!(
                    rect.contains(x as i64, y as i64),
                    "house {} changed pixel ({}, {}) outside {:?}",
                    house,
                    x,
                    y,
                    rect
                );
            }
        }
        assert!(changed > 0, "house {} drew nothing", house);
    }
}

#[test]
fn test_different_houses_render_differently() {
    let renderer = ChartRenderer::default();
    let a = renderer.render_png(&populated(1)).unwrap();
    let b = renderer.render_png(&populated(2)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_custom_size() {
    let renderer = ChartRenderer::new(ChartConfig {
        size: 400,
        ..Default::default()
    })
    .unwrap();
    let image = renderer.render(&populated(4));
    assert_eq!(image.dimensions(), (400, 400));
}
