use rasterlayers::{ErrorKind, Image, Layer, LayerId};

fn three_layer_image() -> (Image, Vec<LayerId>) {
    let mut image = Image::blank(10, 10).unwrap();
    let ids = ["0", "1", "2"]
        .into_iter()
        .map(|name| image.new_layer_named(name).id())
        .collect();
    (image, ids)
}

fn names(image: &Image) -> Vec<String> {
    let mut out = Vec::new();
    let mut index = 0;
    while let Some(layer) = image.layer_by_index(index) {
        out.push(layer.name.clone());
        index += 1;
    }
    out
}

#[test]
fn fresh_image_has_layers_in_creation_order() {
    let (image, ids) = three_layer_image();
    assert_eq!(ids.len(), 3);
    assert_eq!(names(&image), ["0", "1", "2"]);
}

#[test]
fn put_top() {
    let (mut image, ids) = three_layer_image();
    assert_eq!(image.reorder(ids[0]).unwrap().put_top().unwrap(), 2);
    assert_eq!(names(&image), ["1", "2", "0"]);
}

#[test]
fn put_bottom() {
    let (mut image, ids) = three_layer_image();
    assert_eq!(image.reorder(ids[2]).unwrap().put_bottom().unwrap(), 0);
    assert_eq!(names(&image), ["2", "0", "1"]);
}

#[test]
fn put_over() {
    let (mut image, ids) = three_layer_image();

    // upwards
    assert_eq!(image.reorder(ids[0]).unwrap().put_over(ids[2]).unwrap(), 2);
    assert_eq!(names(&image), ["1", "2", "0"]);

    // downwards
    assert_eq!(image.reorder(ids[0]).unwrap().put_over(ids[1]).unwrap(), 1);
    assert_eq!(names(&image), ["1", "0", "2"]);

    let detached = Layer::new();
    let err = image.reorder(ids[0]).unwrap().put_over(detached.id()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(names(&image), ["1", "0", "2"]);
}

#[test]
fn put_behind() {
    let (mut image, ids) = three_layer_image();

    // upwards
    assert_eq!(image.reorder(ids[0]).unwrap().put_behind(ids[2]).unwrap(), 1);
    assert_eq!(names(&image), ["1", "0", "2"]);

    // downwards
    assert_eq!(image.reorder(ids[2]).unwrap().put_behind(ids[1]).unwrap(), 0);
    assert_eq!(names(&image), ["2", "1", "0"]);

    let detached = Layer::new();
    let err = image.reorder(ids[0]).unwrap().put_behind(detached.id()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn put_at() {
    let (mut image, ids) = three_layer_image();

    // upwards
    assert_eq!(image.reorder(ids[0]).unwrap().put_at(2).unwrap(), 2);
    assert_eq!(names(&image), ["1", "2", "0"]);
    assert_eq!(image.reorder(ids[1]).unwrap().put_at(1).unwrap(), 1);
    assert_eq!(names(&image), ["2", "1", "0"]);

    // downwards
    assert_eq!(image.reorder(ids[0]).unwrap().put_at(0).unwrap(), 0);
    assert_eq!(names(&image), ["0", "2", "1"]);

    // past the end lands on top
    assert_eq!(image.reorder(ids[2]).unwrap().put_at(5).unwrap(), 2);
    assert_eq!(names(&image), ["0", "1", "2"]);

    // negative counts from the top
    assert_eq!(image.reorder(ids[1]).unwrap().put_at(-1).unwrap(), 2);
    assert_eq!(names(&image), ["0", "2", "1"]);

    let err = image.reorder(ids[1]).unwrap().put_at(-4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(names(&image), ["0", "2", "1"]);
}

#[test]
fn reordering_a_foreign_layer_fails() {
    let (mut image, _) = three_layer_image();
    let stranger = Layer::new();
    let err = image.reorder(stranger.id()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
}

#[test]
fn layer_count_and_lookup() {
    let zero = Image::blank(50, 50).unwrap();
    let one = Image::new(200, 100).unwrap();
    let (two, ids) = {
        let mut image = Image::new(200, 100).unwrap();
        let id = image.new_layer().id();
        (image, id)
    };
    assert_eq!(zero.layer_count(), 0);
    assert_eq!(one.layer_count(), 1);
    assert_eq!(two.layer_count(), 2);

    assert_eq!(two.layer_by_index(-1).map(Layer::id), Some(ids));
    assert_eq!(two.layer_by_index(1).map(Layer::id), Some(ids));
    assert!(two.layer_by_index(-3).is_none());
    assert!(two.layer_by_index(2).is_none());
    assert_eq!(two.layer_stack().index_of(ids), Some(1));
}
