use std::cell::Cell;
use std::rc::Rc;

use fb_core::Tolerance;
use fb_project::*;
use fb_regulator::{
    Endpoint, LinearizationMethod, NoDelay, RegulatorConfig, generator_fn, meter_fn,
};

fn offset_setup() -> CalibrationSetup {
    CalibrationSetup {
        version: LATEST_VERSION,
        name: "Offset bench".to_string(),
        regulator: RegulatorConfig::default()
            .with_method(LinearizationMethod::Offset)
            .with_safe_start(0.0)
            .with_conservative_factor(0.0)
            .with_tolerance(Tolerance::absolute(0.5)),
        generator: ChannelDef::new("V"),
        meter: ChannelDef::new("V"),
        limiting: None,
    }
}

#[test]
fn built_controller_regulates() {
    let output = Rc::new(Cell::new(0.0));
    let written = output.clone();
    let measured = output.clone();

    let setup = offset_setup();
    let mut controller = setup
        .build_controller(
            generator_fn(move |v| {
                written.set(v);
                Some(v)
            }),
            meter_fn(move || Some(measured.get() + 2.0)),
            None,
        )
        .unwrap()
        .with_delay(NoDelay);

    assert!(controller.is_configured());
    assert!(!controller.limiting_meter_enabled());
    assert!(controller.set_regulated_value(10.0).unwrap());
    assert!((output.get() - 8.0).abs() < 1e-9);
}

#[test]
fn limiting_endpoint_must_match_setup() {
    let setup = offset_setup();
    let limiting: Box<dyn Endpoint> = Box::new(meter_fn(|| Some(1.0)));
    let err = setup
        .build_controller(generator_fn(Some), meter_fn(|| Some(0.0)), Some(limiting))
        .err()
        .unwrap();
    assert!(matches!(err, ProjectError::Endpoint { .. }));

    let mut setup = offset_setup();
    setup.limiting = Some(LimitingDef {
        unit: "A".to_string(),
        limit: 5.0,
        tolerance: Tolerance::absolute(0.1),
        method: LinearizationMethod::Offset,
    });
    let err = setup
        .build_controller(generator_fn(Some), meter_fn(|| Some(0.0)), None)
        .err()
        .unwrap();
    assert!(matches!(err, ProjectError::Endpoint { .. }));
}

#[test]
fn built_controller_carries_limiting_meter() {
    let mut setup = offset_setup();
    setup.limiting = Some(LimitingDef {
        unit: "A".to_string(),
        limit: 5.0,
        tolerance: Tolerance::absolute(0.1),
        method: LinearizationMethod::Offset,
    });
    let limiting: Box<dyn Endpoint> = Box::new(meter_fn(|| Some(6.0)));

    let mut controller = setup
        .build_controller(generator_fn(Some), meter_fn(|| Some(10.0)), Some(limiting))
        .unwrap()
        .with_delay(NoDelay);

    assert!(controller.limiting_meter_enabled());
    assert_eq!(controller.limiting_meter().unwrap().unit().raw(), "A");
    // Meter sits on target but the limiting reading is above the ceiling.
    controller.config_mut().max_steps = 3;
    assert!(!controller.set_regulated_value(10.0).unwrap());
}
