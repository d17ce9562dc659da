//! fb-project: calibration setup files and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_setup};

use fb_regulator::{Endpoint, Generator, RegulationController, RegulationError};

pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Regulator error: {0}")]
    Regulation(#[from] RegulationError),

    #[error("Endpoint mismatch: {what}")]
    Endpoint { what: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<CalibrationSetup> {
    let content = std::fs::read_to_string(path)?;
    let setup: CalibrationSetup = serde_yaml::from_str(&content)?;
    validate_setup(&setup)?;
    Ok(setup)
}

pub fn save_yaml(path: &std::path::Path, setup: &CalibrationSetup) -> ProjectResult<()> {
    validate_setup(setup)?;
    let content = serde_yaml::to_string(setup)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<CalibrationSetup> {
    let content = std::fs::read_to_string(path)?;
    let setup: CalibrationSetup = serde_json::from_str(&content)?;
    validate_setup(&setup)?;
    Ok(setup)
}

pub fn save_json(path: &std::path::Path, setup: &CalibrationSetup) -> ProjectResult<()> {
    validate_setup(setup)?;
    let content = serde_json::to_string_pretty(setup)?;
    std::fs::write(path, content)?;
    Ok(())
}

impl CalibrationSetup {
    /// Build a controller for this setup around caller-supplied endpoints.
    ///
    /// A limiting endpoint must be given exactly when the setup declares a
    /// limiting meter.
    pub fn build_controller(
        &self,
        generator: impl Generator + 'static,
        meter: impl Endpoint + 'static,
        limiting_meter: Option<Box<dyn Endpoint>>,
    ) -> ProjectResult<RegulationController> {
        validate_setup(self)?;
        let mut controller = RegulationController::with_config(self.regulator.clone())?;
        controller.set_generator(generator, self.generator.unit.as_str());
        controller.set_meter(meter, self.meter.unit.as_str());

        match (&self.limiting, limiting_meter) {
            (Some(def), Some(endpoint)) => {
                controller.set_limiting_meter(endpoint, def.unit.as_str(), def.to_config())?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(ProjectError::Endpoint {
                    what: "setup declares a limiting meter but no endpoint was given",
                });
            }
            (None, Some(_)) => {
                return Err(ProjectError::Endpoint {
                    what: "limiting endpoint given but setup declares no limiting meter",
                });
            }
        }
        Ok(controller)
    }
}
