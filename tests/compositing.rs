use rasterlayers::{
    Anchor, Color, DefaultComposer, Image, PaintMode, Raster, Rect, Size, TiledComposer,
};

/// 100×50 canvas with four 21px bars; each bar overwrites the first column
/// of the next.
fn bars() -> Image {
    let mut base = Raster::new(100, 50);
    let bars = [0x00FF_0000, 0x0000_FF00, 0x0000_37FF, 0x4F83_FA12];
    for (i, argb) in bars.into_iter().enumerate() {
        let rect = Rect::new(i as i32 * 20, 0, 21, 50);
        base.fill_rect(rect, Color::from_argb(argb), PaintMode::Replace);
    }
    Image::from_raster(base).unwrap()
}

fn channel_diff(a: Color, b: Color) -> u8 {
    [
        a.alpha().abs_diff(b.alpha()),
        a.red().abs_diff(b.red()),
        a.green().abs_diff(b.green()),
        a.blue().abs_diff(b.blue()),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

#[track_caller]
fn assert_close(raster: &Raster, x: i32, y: i32, expected: u32, tolerance: u8) {
    let actual = raster.get_pixel(x, y);
    let expected = Color::from_argb(expected);
    assert!(
        channel_diff(actual, expected) <= tolerance,
        "pixel ({x},{y}) is {actual:?}, expected {expected:?} ±{tolerance}"
    );
}

#[test]
fn translucent_rectangle_over_bars() {
    let mut image = bars();
    image
        .new_layer()
        .surface_mut()
        .fill_rect(Rect::new(5, 25, 91, 21), Color::from_argb(0x3F00_00FF), PaintMode::Replace);
    let merged = image.merged_raster().unwrap();

    // untouched bars
    assert_close(&merged, 0, 0, 0x00FF_0000, 0);
    assert_close(&merged, 20, 0, 0x0000_FF00, 0);
    assert_close(&merged, 39, 0, 0x0000_FF00, 0);
    assert_close(&merged, 40, 0, 0x0000_37FF, 0);
    assert_close(&merged, 60, 0, 0x4F83_FA12, 0);
    assert_close(&merged, 81, 0, 0x7F00_0000, 0);

    // overpainted
    assert_close(&merged, 5, 25, 0x007F_0080, 2);
    assert_close(&merged, 20, 25, 0x0000_7F80, 2);
    assert_close(&merged, 40, 25, 0x0000_1BFF, 2);
    assert_close(&merged, 60, 25, 0x2723_44BE, 2);
    assert_close(&merged, 81, 25, 0x3F00_00FF, 2);
}

#[test]
fn quarter_opacity_layer_blends_linearly() {
    let mut image = bars();
    let top = image.new_layer();
    top.set_opacity(25.0);
    top.surface_mut()
        .fill_rect(Rect::new(5, 25, 91, 21), Color::rgb(0, 0, 255), PaintMode::Replace);
    let merged = image.merged_raster().unwrap();

    let px = merged.get_pixel(5, 25);
    assert!(px.red().abs_diff(190) <= 2, "{px:?}");
    assert!(px.blue().abs_diff(64) <= 2, "{px:?}");
    assert!(px.is_opaque());
    // outside the rectangle nothing changed
    assert_close(&merged, 5, 10, 0x00FF_0000, 0);
}

#[test]
fn gamma_blending_lifts_the_midtones() {
    let paint = |image: &mut Image| {
        let top = image.new_layer();
        top.set_opacity(25.0);
        top.surface_mut()
            .fill_rect(Rect::new(5, 25, 91, 21), Color::rgb(0, 0, 255), PaintMode::Replace);
    };

    let mut linear = bars();
    paint(&mut linear);
    let mut gamma = bars();
    gamma.set_composer(DefaultComposer::with_gamma_blending(true));
    paint(&mut gamma);

    let lin = linear.merged_raster().unwrap().get_pixel(5, 25);
    let gam = gamma.merged_raster().unwrap().get_pixel(5, 25);
    assert!(gam.red() > lin.red(), "gamma {gam:?} vs linear {lin:?}");
    assert!(gam.blue() > lin.blue(), "gamma {gam:?} vs linear {lin:?}");
    assert!(gam.is_opaque());
}

#[test]
fn moved_selection_composites_at_new_place() {
    let mut image = Image::blank(20, 20).unwrap();
    image.new_layer_named("bg").fill(Color::WHITE);
    let ink = image.new_layer_named("ink");
    ink.surface_mut().fill_rect(Rect::new(0, 0, 4, 4), Color::RED, PaintMode::Replace);
    ink.select(0, 0, 4, 4).move_to(0, 0, Anchor::BOTTOM_RIGHT).apply();

    let merged = image.merged_raster().unwrap();
    assert_eq!(merged.get_pixel(1, 1), Color::WHITE);
    assert_eq!(merged.get_pixel(17, 17), Color::RED);
    assert_eq!(merged.get_pixel(15, 15), Color::WHITE);
}

#[test]
fn single_layer_image_merges_to_itself() {
    let mut raster = Raster::filled(7, 3, Color::rgb(10, 20, 30));
    raster.put_pixel(6, 2, Color::TRANSPARENT);
    let mut image = Image::from_raster(raster.clone()).unwrap();
    image.layer_by_index_mut(0).unwrap().set_opacity(10.0);

    let merged = image.merged().unwrap();
    assert_eq!(merged.surface().pixels(), raster.pixels());
    assert!(merged.surface().save_alpha());
    assert_eq!(image.layer_count(), 1);
}

#[test]
fn resizing_the_canvas_reconciles_layers() {
    let mut image = bars();
    image.set_size(120, 60).unwrap();
    let merged = image.merged_raster().unwrap();
    assert_eq!(merged.size(), Size::new(120, 60));
    assert_close(&merged, 0, 0, 0x00FF_0000, 0);
    assert!(merged.get_pixel(110, 55).is_transparent());
}

#[test]
fn tiled_composer_shows_every_layer() {
    let mut image = bars();
    image.new_layer_named("blue").fill(Color::rgb(0, 0, 200));
    image.set_composer(TiledComposer::new());
    let merged = image.merged_raster().unwrap();
    assert_eq!(merged.size(), Size::new(100, 50));
    // 2×2 grid: the second cell holds the solid blue layer
    assert_eq!(merged.get_pixel(75, 5), Color::rgb(0, 0, 200));
    assert_eq!(merged.get_pixel(50, 5), Color::RED);
    assert_eq!(image.layer_count(), 2);
}

#[test]
fn exported_png_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bars.png");
    let mut image = bars();
    image
        .export()
        .unwrap()
        .as_file(&path, rasterlayers::ExportFormat::Png, None)
        .unwrap();

    let reloaded = Image::from_file(&path).unwrap();
    assert_eq!(reloaded.size(), Size::new(100, 50));
    assert_eq!(reloaded.layer_by_index(0).unwrap().name, "bars.png");
    let px = reloaded.layer_by_index(0).unwrap().surface().get_pixel(60, 0);
    assert!(channel_diff(px, Color::from_argb(0x4F83_FA12)) <= 1, "{px:?}");
}
