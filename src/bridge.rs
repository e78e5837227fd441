//! # Bridge Assembly
//!
//! Builds the encoders named in the configuration, registers them on the
//! scheduler and exposes their fields as input paths:
//!
//! | Section          | Paths                                                            |
//! |------------------|------------------------------------------------------------------|
//! | `[[rapid]]`      | `engine.N.speed`, `engine.N.boost_pressure`, `engine.N.tilt_trim` |
//! | `[[dynamic]]`    | `engine.N.<parameter>`, `engine.N.load`, `engine.N.torque`, `engine.N.<alarm>` |
//! | `[[fluid_level]]`| `tank.N.level` (ratio 0..1)                                       |
//! | `[[temperature]]`| `temperature.N` (kelvin)                                          |

use std::rc::Rc;
use std::time::Duration;

use tracing::info;

use crate::clock::ClockRef;
use crate::config::Config;
use crate::encoders::dynamic::{DynamicParameterEncoder, EngineAlarm, EngineDynamic, EngineParameter};
use crate::encoders::fluid_level::{FluidLevel, FluidLevelEncoder};
use crate::encoders::rapid::{RapidUpdate, RapidUpdateEncoder};
use crate::encoders::temperature::{TemperatureEncoder, TemperatureExt};
use crate::encoders::Scheduler;
use crate::error::Result;
use crate::flow::{Consumer, RateLimiter};
use crate::input::InputRouter;
use crate::n2k::{FluidType, TemperatureSource};

/// Every configured encoder plus the input table feeding them
#[derive(Debug)]
pub struct Bridge {
    rapid: Vec<RapidUpdateEncoder>,
    dynamic: Vec<DynamicParameterEncoder>,
    fluid_level: Vec<FluidLevelEncoder>,
    temperature: Vec<TemperatureEncoder>,
    inputs: InputRouter,
}

impl Bridge {
    /// Build and enable the encoders of every enabled section
    ///
    /// # Errors
    ///
    /// Returns error if a section fails encoder validation or two sections
    /// claim the same input path
    pub fn build(config: &Config, scheduler: &mut Scheduler) -> Result<Self> {
        let clock = Rc::clone(scheduler.clock());
        let limits = InputLimits {
            min_delay: Duration::from_millis(config.input.min_delay_ms),
            clock: Rc::clone(&clock),
        };
        let mut bridge = Self {
            rapid: Vec::new(),
            dynamic: Vec::new(),
            fluid_level: Vec::new(),
            temperature: Vec::new(),
            inputs: InputRouter::new(),
        };

        for section in config.rapid.iter().filter(|s| s.enabled) {
            let mut encoder = RapidUpdateEncoder::new(RapidUpdate::new(0, Rc::clone(&clock)));
            encoder.set_configuration(&section.settings())?;

            let prefix = format!("engine.{}", section.engine_instance);
            let inputs = &mut bridge.inputs;
            inputs.register_number(format!("{prefix}.speed"), limits.apply(encoder.engine_speed_consumer()))?;
            inputs.register_number(
                format!("{prefix}.boost_pressure"),
                limits.apply(encoder.boost_pressure_consumer()),
            )?;
            inputs.register_percent(format!("{prefix}.tilt_trim"), encoder.tilt_trim_consumer())?;

            encoder.enable(scheduler);
            bridge.rapid.push(encoder);
        }

        for section in config.dynamic.iter().filter(|s| s.enabled) {
            let mut encoder = DynamicParameterEncoder::new(EngineDynamic::new(0, Rc::clone(&clock)));
            encoder.set_configuration(&section.settings())?;

            let prefix = format!("engine.{}", section.engine_instance);
            let inputs = &mut bridge.inputs;
            for parameter in EngineParameter::ALL {
                inputs.register_number(
                    format!("{prefix}.{parameter}"),
                    limits.apply(encoder.parameter_consumer(parameter)),
                )?;
            }
            inputs.register_percent(format!("{prefix}.load"), encoder.engine_load_consumer())?;
            inputs.register_percent(format!("{prefix}.torque"), encoder.engine_torque_consumer())?;
            for alarm in EngineAlarm::ALL {
                inputs.register_flag(format!("{prefix}.{alarm}"), encoder.alarm_consumer(alarm))?;
            }

            encoder.enable(scheduler);
            bridge.dynamic.push(encoder);
        }

        for section in config.fluid_level.iter().filter(|s| s.enabled) {
            let mut encoder = FluidLevelEncoder::new(FluidLevel::new(0, FluidType::Fuel, 0.0, Rc::clone(&clock)));
            encoder.set_configuration(&section.settings())?;

            bridge.inputs.register_number(
                format!("tank.{}.level", section.tank_instance),
                limits.apply(encoder.tank_level_consumer()),
            )?;

            encoder.enable(scheduler);
            bridge.fluid_level.push(encoder);
        }

        for section in config.temperature.iter().filter(|s| s.enabled) {
            let mut encoder =
                TemperatureEncoder::new(TemperatureExt::new(0, TemperatureSource::Sea, Rc::clone(&clock)));
            encoder.set_configuration(&section.settings())?;

            bridge.inputs.register_number(
                format!("temperature.{}", section.temperature_instance),
                limits.apply(encoder.temperature_consumer()),
            )?;

            encoder.enable(scheduler);
            bridge.temperature.push(encoder);
        }

        info!(
            "Bridge ready: {} rapid, {} dynamic, {} fluid level, {} temperature encoders, {} inputs",
            bridge.rapid.len(),
            bridge.dynamic.len(),
            bridge.fluid_level.len(),
            bridge.temperature.len(),
            bridge.inputs.len()
        );

        Ok(bridge)
    }

    /// Number of enabled encoders
    pub fn encoder_count(&self) -> usize {
        self.rapid.len() + self.dynamic.len() + self.fluid_level.len() + self.temperature.len()
    }

    pub fn rapid(&self) -> &[RapidUpdateEncoder] {
        &self.rapid
    }

    pub fn dynamic(&self) -> &[DynamicParameterEncoder] {
        &self.dynamic
    }

    pub fn fluid_level(&self) -> &[FluidLevelEncoder] {
        &self.fluid_level
    }

    pub fn temperature(&self) -> &[TemperatureEncoder] {
        &self.temperature
    }

    /// Input table
    pub fn inputs(&self) -> &InputRouter {
        &self.inputs
    }

    /// Hand the input table to the feed task.
    ///
    /// The encoders keep running: their state is shared with the scheduler.
    pub fn into_inputs(self) -> InputRouter {
        self.inputs
    }
}

/// Optional rate limiting in front of numeric inputs
struct InputLimits {
    min_delay: Duration,
    clock: ClockRef,
}

impl InputLimits {
    fn apply(&self, consumer: Rc<dyn Consumer<f64>>) -> Rc<dyn Consumer<f64>> {
        if self.min_delay.is_zero() {
            return consumer;
        }
        let limiter = Rc::new(RateLimiter::new(self.min_delay, Rc::clone(&self.clock)));
        limiter.connect_to(consumer);
        limiter
    }
}
