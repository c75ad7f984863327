//! # 評価関数
//! ゲインから閉ループをシミュレーションし、以下の合計をコストとする
//!
//! - 全サンプルの追従誤差の絶対値 |目標値 - プロセス値|
//! - 整定期限（開始からsettling_deadline）以降、誤差が目標値のtolerance_ratioを超えた
//!   サンプル1つにつきpenalty
//!
//! 出力制限とペナルティの閾値があるため、ゲインに対して不連続な関数になる。

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

use crate::simcore::sim_config::SimulationConfig;
use crate::simcore::sim_model::controller_models::GainVector;
use crate::simcore::sim_model::sink_models::Trajectory;
use crate::simcore::sim_system::FlowLoopSystem;

use super::evaluator::CostFunction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub settling_deadline: f64, // 整定期限（開始時刻からの経過時間）
    pub tolerance_ratio: f64,   // 許容誤差（目標値に対する比率）
    pub penalty: f64,           // 許容誤差を超えたサンプル1つあたりのペナルティ
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            settling_deadline: 1.5,
            tolerance_ratio: 0.05,
            penalty: 1000.0,
        }
    }
}

impl ObjectiveConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.settling_deadline.is_finite() && self.settling_deadline >= 0.0,
            "ObjectiveConfig: 整定期限 >= 0である必要があります。({})", self.settling_deadline);
        ensure!(self.tolerance_ratio.is_finite() && self.tolerance_ratio >= 0.0,
            "ObjectiveConfig: 許容誤差の比率 >= 0である必要があります。({})", self.tolerance_ratio);
        ensure!(self.penalty.is_finite() && self.penalty >= 0.0,
            "ObjectiveConfig: ペナルティ >= 0である必要があります。({})", self.penalty);
        Ok(())
    }
}

/// コストの内訳
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub total_error: f64,       // 追従誤差の絶対値の合計
    pub penalized_steps: usize, // ペナルティ対象のサンプル数
    pub cost: f64,              // total_error + penalty * penalized_steps
}

/// 追従誤差による評価関数
#[derive(Debug, Clone)]
pub struct TrackingObjective {
    system: FlowLoopSystem,
    config: ObjectiveConfig,
}

impl TrackingObjective {
    pub fn new(system: FlowLoopSystem, config: ObjectiveConfig) -> anyhow::Result<Self> {
        config.validate().context("TrackingObjective: 評価関数の設定が不正です。")?;
        Ok(Self { system, config })
    }

    pub fn from_config(simulation: &SimulationConfig, config: ObjectiveConfig) -> anyhow::Result<Self> {
        let system = FlowLoopSystem::new(simulation)?;
        Self::new(system, config)
    }

    pub fn system(&self) -> &FlowLoopSystem {
        &self.system
    }

    pub fn config(&self) -> &ObjectiveConfig {
        &self.config
    }

    /// Trajectoryからコストを計算する
    pub fn score(&self, trajectory: &Trajectory) -> CostBreakdown {
        let start_time = self.system.sim_time().start_time();
        let mut total_error = 0.0;
        let mut penalized_steps = 0;

        for rec in trajectory.iter() {
            let err = (rec.setpoint - rec.process_value).abs();
            total_error += err;

            let settled = rec.time - start_time > self.config.settling_deadline;
            // NaNも許容誤差外として扱う
            if settled && !(err <= self.config.tolerance_ratio * rec.setpoint) {
                penalized_steps += 1;
            }
        }

        CostBreakdown {
            total_error: total_error,
            penalized_steps: penalized_steps,
            cost: total_error + self.config.penalty * penalized_steps as f64,
        }
    }

    /// シミュレーションしてコストの内訳を返す
    pub fn evaluate(&self, gains: &GainVector) -> anyhow::Result<CostBreakdown> {
        let trajectory = self.system.run(gains)?;
        Ok(self.score(&trajectory))
    }
}

impl CostFunction for TrackingObjective {
    /// 評価できないゲインは+∞（探索で選ばれない）
    fn cost(&self, gains: &GainVector) -> f64 {
        match self.evaluate(gains) {
            Ok(breakdown) => breakdown.cost,
            Err(_) => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod objective_test {
    use super::*;

    fn objective() -> TrackingObjective {
        TrackingObjective::from_config(&SimulationConfig::default(), ObjectiveConfig::default()).unwrap()
    }

    #[test]
    fn zero_control_is_penalized() {
        // ゲイン0かつ入口流量 > 目標値 なので制御出力は常に0、プロセス値は0のまま
        let obj = objective();
        let breakdown = obj.evaluate(&GainVector::new(0.0, 0.0, 0.0)).unwrap();

        let traj = obj.system().run(&GainVector::new(0.0, 0.0, 0.0)).unwrap();
        let late_steps = traj.iter().filter(|rec| rec.time > 1.5).count();
        let error_sum: f64 = traj.iter().map(|rec| rec.setpoint).sum();

        assert!(traj.iter().all(|rec| rec.process_value == 0.0));
        assert_eq!(breakdown.penalized_steps, late_steps);
        assert_eq!(breakdown.total_error, error_sum);
        assert!(breakdown.cost > 1000.0 * late_steps as f64);
        assert_eq!(obj.cost(&GainVector::new(0.0, 0.0, 0.0)), breakdown.cost);
    }

    #[test]
    fn cost_is_non_negative_and_finite() {
        let obj = objective();
        for g in [GainVector::new(1.0, 0.1, 0.05), GainVector::new(10.0, 1.0, 1.0), GainVector::new(0.3, 0.0, 0.9)].iter() {
            let c = obj.cost(g);
            assert!(c >= 0.0);
            assert!(c.is_finite());
        }
    }

    #[test]
    fn no_penalty_before_deadline() {
        // 期限を終了時刻より後にすればペナルティは発生しない
        let cfg = ObjectiveConfig { settling_deadline: 100.0, ..ObjectiveConfig::default() };
        let obj = TrackingObjective::from_config(&SimulationConfig::default(), cfg).unwrap();

        let breakdown = obj.evaluate(&GainVector::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(breakdown.penalized_steps, 0);
        assert_eq!(breakdown.cost, breakdown.total_error);
    }

    #[test]
    fn non_finite_gains_are_rejected() {
        let obj = objective();
        let gains = GainVector::new(f64::NAN, 0.1, 0.05);

        assert!(obj.evaluate(&gains).is_err());
        assert_eq!(obj.cost(&gains), f64::INFINITY);
    }

    #[test]
    fn reject_bad_config() {
        let cfg = ObjectiveConfig { penalty: -1.0, ..ObjectiveConfig::default() };
        assert!(TrackingObjective::from_config(&SimulationConfig::default(), cfg).is_err());

        let cfg = ObjectiveConfig { tolerance_ratio: f64::NAN, ..ObjectiveConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
