//! よく使う型と関数の再エクスポート

pub use crate::simcore::sim_common::Saturation;
pub use crate::simcore::sim_config::{PhysicalConstants, SetpointStep, SimulationConfig, TimeGridDef};
pub use crate::simcore::sim_model::controller_models::{ControlOutput, FlowPIDController, GainVector};
pub use crate::simcore::sim_model::sink_models::{Trajectory, TrajectoryRecord};
pub use crate::simcore::sim_model::source_models::{DisturbanceModel, DisturbanceSample, StepSchedule};
pub use crate::simcore::sim_system::{simulate, FlowLoopSystem, SimTime};
pub use crate::simcore::sim_tuner::bounds::GainBounds;
pub use crate::simcore::sim_tuner::driver::{ResultSelection, TuneConfig, TuningDriver, TuningReport};
pub use crate::simcore::sim_tuner::evaluator::CostFunction;
pub use crate::simcore::sim_tuner::genetic::GeneticAlgorithm;
pub use crate::simcore::sim_tuner::grid::GridSearch;
pub use crate::simcore::sim_tuner::objective::{CostBreakdown, ObjectiveConfig, TrackingObjective};
pub use crate::simcore::sim_tuner::optimizer::{Minimizer, SearchMethod, SearchResult};
pub use crate::simcore::sim_tuner::swarm::ParticleSwarm;
