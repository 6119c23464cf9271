use approx::assert_relative_eq;
use wind_shear_core::{
    AmbientShear, FieldData, LogProfile, ShearConfig, WindConvention, WindRecord, WindSample,
    WindSeries, WindShear,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn series() -> WindSeries {
    let records = vec![
        WindRecord {
            time: 0.0,
            speed: 8.0,
            direction: 270.0,
        },
        WindRecord {
            time: 3600.0,
            speed: 12.0,
            direction: 270.0,
        },
    ];
    WindSeries::new(records, WindConvention::Nautical).unwrap()
}

#[test]
fn test_step_on_flat_bed_returns_ambient_shear() {
    let (cols, rows) = (24, 16);
    let x = FieldData::from_fn(cols, rows, |i, _| i as f64);
    let y = FieldData::from_fn(cols, rows, |_, j| j as f64);
    let config = ShearConfig {
        buffer_cells: 30,
        ..ShearConfig::default()
    };
    let mut shear = WindShear::new(x, y, FieldData::new(cols, rows), config).unwrap();

    let sample = series().at(1800.0);
    assert_relative_eq!(sample.speed, 10.0);
    // Nautical westerly blows towards +x
    assert_relative_eq!(sample.direction, 0.0, epsilon = 1e-9);

    let profile = LogProfile::default();
    let alfa = FieldData::new(cols, rows);
    let ambient = AmbientShear::from_wind(sample, &alfa, &profile, false);

    let update = shear
        .step(
            FieldData::new(cols, rows),
            &ambient,
            sample.speed,
            sample.engine_direction(),
            true,
        )
        .unwrap();

    for k in 0..update.taus.len() {
        assert_relative_eq!(update.taus.data[k], ambient.taus.data[k], epsilon = 1e-9);
        assert_relative_eq!(update.taun.data[k], 0.0, epsilon = 1e-9);
        assert_relative_eq!(update.tau.data[k], ambient.tau.data[k], epsilon = 1e-9);
        assert_eq!(update.hsep.data[k], 0.0);
        assert_eq!(update.zsep.data[k], 0.0);
    }
}

#[test]
fn test_step_reports_separation_surface_above_bed() {
    let (cols, rows) = (200, 2);
    let x = FieldData::from_fn(cols, rows, |i, _| i as f64);
    let y = FieldData::from_fn(cols, rows, |_, j| j as f64);
    // Plateau of 6 m dropping at 45° at x = 80
    let zb = FieldData::from_fn(cols, rows, |i, _| (6.0 - (i as f64 - 80.0).max(0.0)).max(0.0));
    let config = ShearConfig {
        buffer_cells: 30,
        ..ShearConfig::default()
    };
    let mut shear = WindShear::new(x, y, zb.clone(), config).unwrap();

    let sample = series().at(0.0);
    let ambient =
        AmbientShear::from_wind(sample, &FieldData::new(cols, rows), &LogProfile::default(), false);
    // Westerly wind: the computational rows run along +x
    assert_relative_eq!(sample.engine_direction(), -90.0, epsilon = 1e-9);
    let update = shear
        .step(zb.clone(), &ambient, sample.speed, sample.engine_direction(), true)
        .unwrap();

    assert!(update.hsep.max() > 1.0);
    for k in 0..zb.len() {
        assert_relative_eq!(update.zsep.data[k], zb.data[k] + update.hsep.data[k]);
        assert!(update.zsep.data[k] >= zb.data[k] - 1e-12);
    }
}

#[test]
fn test_step_follows_sample_direction_over_hill() {
    let (cols, rows) = (60, 100);
    let x = FieldData::from_fn(cols, rows, |i, _| i as f64);
    let y = FieldData::from_fn(cols, rows, |_, j| j as f64);
    let zb = FieldData::from_fn(cols, rows, |i, j| {
        let (dx, dy) = (i as f64 - 30.0, j as f64 - 50.0);
        2.0 * (-(dx * dx + dy * dy) / (2.0 * 10.0 * 10.0)).exp()
    });
    let config = ShearConfig {
        buffer_cells: 30,
        ..ShearConfig::default()
    };
    let mut shear = WindShear::new(x, y, zb.clone(), config).unwrap();

    // Wind towards +y
    let sample = WindSample {
        speed: 10.0,
        direction: 90.0,
    };
    let ambient =
        AmbientShear::from_wind(sample, &FieldData::new(cols, rows), &LogProfile::default(), false);
    let update = shear
        .step(zb, &ambient, sample.speed, sample.engine_direction(), false)
        .unwrap();

    // Speed-up along the wind peaks on the upwind (low y) side of the crest
    let column = update.taun.column(30);
    let peak = (0..rows)
        .max_by(|&a, &b| column[a].total_cmp(&column[b]))
        .unwrap();
    assert!(column[peak] > ambient.taun.get(30, peak), "No speed-up over the hill");
    assert!((35..50).contains(&peak), "Peak at row {peak} is not upwind of the crest");
}
