use vis_backend::{
    data::{ dataset::JsonDataset, prelude::* },
    objects::*,
    scene_system::Visualization,
};

const CARS: &str = r#"{
    "cars": [
        { "name": "chevelle", "mpg": 18, "horsepower": 130 },
        { "name": "skylark", "mpg": 15, "horsepower": 165 },
        { "name": "satellite", "mpg": 18, "horsepower": 150 },
        { "name": "rebel", "mpg": 16, "horsepower": 150 },
        { "name": "torino", "mpg": 17, "horsepower": 140 },
        { "name": "corolla", "mpg": 31, "horsepower": 65 },
        { "name": "civic", "mpg": 33, "horsepower": 53 },
        { "name": "rabbit", "mpg": 29, "horsepower": 70 }
    ]
}"#;

fn point(vis: &mut Visualization, x: f32, y: f32) -> ObjectId {
    vis.insert(GeoObject::new(Plain::Point(ScenePoint::new(x, y))))
}

/// Horsepower against mpg as a scatter plot of circles.
pub fn scene() -> anyhow::Result<(Visualization, JsonDataset)> {
    let data = JsonDataset::from_str(CARS)?;
    let mut vis = Visualization::default();

    let track = |vis: &mut Visualization, name: &str, field: &str, from: (f32, f32), to: (f32, f32)| {
        let path = Path::new(field);
        let stats = data.basic_statistics(&path)
            .ok_or_else(|| anyhow::anyhow!("`{}` has no numeric records", field))?;
        let (a1, a2) = (point(vis, from.0, from.1), point(vis, to.0, to.1));
        anyhow::Ok(vis.add_object(GeoObject::named(name, Track::with_statistics(path, a1, a2, &stats))))
    };
    let x = track(&mut vis, "horsepower", "cars.horsepower", (-250.0, -150.0), (250.0, -150.0))?;
    let y = track(&mut vis, "mpg", "cars.mpg", (-250.0, -150.0), (-250.0, 150.0))?;

    let points = vis.add_object(GeoObject::named("cars", Scatter::new(x, y)));
    let radius = vis.insert(GeoObject::new(Plain::Number(4.0)));
    vis.add_object(GeoObject::named("dots", Circle::new(Path::new("cars"), points, radius)));

    Ok((vis, data))
}
