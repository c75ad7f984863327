//! # Sourceモデル
//! Sourceモデルには、下記のモデルを実装する
//!
//! - 目標値スケジュール（区分一定のステップ関数）
//! - 外乱モデル（入口流量・温度・圧力の正弦波変動）

use anyhow::anyhow;

use super::super::sim_config::{PhysicalConstants, SetpointStep};

/// 区分一定の目標値スケジュール
/// 時刻tの値は from <= t を満たす最後の区間の値。最初の区間より前は最初の区間の値を使う
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchedule {
    steps: Vec<SetpointStep>, // fromの昇順に並んでいること
}

impl StepSchedule {
    pub fn new(steps: &[SetpointStep]) -> anyhow::Result<Self> {
        if steps.is_empty() {
            return Err(anyhow!("StepSchedule: 目標値の区間を1つ以上設定してください。"));
        }

        for step in steps.iter() {
            if !step.from.is_finite() || !step.value.is_finite() {
                return Err(anyhow!("StepSchedule: 区間の時刻と目標値は有限の値で設定してください。(from = {}, value = {})", step.from, step.value));
            }
        }

        if let Some(pair) = steps.windows(2).find(|pair| pair[1].from <= pair[0].from) {
            return Err(anyhow!("StepSchedule: 区間の開始時刻は昇順で設定してください。({} の後に {})", pair[0].from, pair[1].from));
        }

        Ok(Self { steps: steps.to_vec() })
    }

    /// 時刻tの目標値
    pub fn value_at(&self, time: f64) -> f64 {
        // fromが time 以下である区間の数
        let idx = self.steps.partition_point(|step| step.from <= time);
        self.steps[idx.saturating_sub(1)].value
    }

    pub fn steps(&self) -> &[SetpointStep] {
        &self.steps
    }
}

/// ある時刻の外乱値（保存はせず、時刻から都度計算する）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisturbanceSample {
    pub inlet_flow: f64,  // 入口流量
    pub temperature: f64, // 温度
    pub pressure: f64,    // 圧力
}

/// 外乱モデル
/// - 入口流量 = 基準流量 + 2 sin(0.1t)
/// - 温度     = 基準温度 + 5 cos(0.1t)
/// - 圧力     = 基準圧力 + 1 sin(0.05t)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisturbanceModel {
    constants: PhysicalConstants,
}

const FLOW_AMPLITUDE: f64 = 2.0;
const FLOW_OMEGA: f64 = 0.1;
const TEMPERATURE_AMPLITUDE: f64 = 5.0;
const TEMPERATURE_OMEGA: f64 = 0.1;
const PRESSURE_AMPLITUDE: f64 = 1.0;
const PRESSURE_OMEGA: f64 = 0.05;

impl DisturbanceModel {
    pub fn new(constants: PhysicalConstants) -> Self {
        Self { constants }
    }

    pub fn inlet_flow(&self, time: f64) -> f64 {
        self.constants.initial_flow + FLOW_AMPLITUDE * (FLOW_OMEGA * time).sin()
    }

    pub fn temperature(&self, time: f64) -> f64 {
        self.constants.initial_temperature + TEMPERATURE_AMPLITUDE * (TEMPERATURE_OMEGA * time).cos()
    }

    pub fn pressure(&self, time: f64) -> f64 {
        self.constants.initial_pressure + PRESSURE_AMPLITUDE * (PRESSURE_OMEGA * time).sin()
    }

    pub fn sample(&self, time: f64) -> DisturbanceSample {
        DisturbanceSample {
            inlet_flow: self.inlet_flow(time),
            temperature: self.temperature(time),
            pressure: self.pressure(time),
        }
    }
}

#[cfg(test)]
mod source_models_test {
    use super::*;
    use approx::assert_relative_eq;

    fn schedule() -> StepSchedule {
        StepSchedule::new(&[
            SetpointStep::new(0.0, 8.0),
            SetpointStep::new(10.0, 9.0),
            SetpointStep::new(20.0, 10.0),
        ]).unwrap()
    }

    #[test]
    fn step_schedule_test() {
        let sch = schedule();

        assert_eq!(sch.value_at(-1.0), 8.0); // 最初の区間より前
        assert_eq!(sch.value_at(0.0), 8.0);
        assert_eq!(sch.value_at(9.999), 8.0);
        assert_eq!(sch.value_at(10.0), 9.0); // 境界は新しい区間
        assert_eq!(sch.value_at(19.5), 9.0);
        assert_eq!(sch.value_at(20.0), 10.0);
        assert_eq!(sch.value_at(1e6), 10.0);
    }

    #[test]
    fn step_schedule_reject() {
        assert!(StepSchedule::new(&[]).is_err());
        assert!(StepSchedule::new(&[SetpointStep::new(5.0, 1.0), SetpointStep::new(5.0, 2.0)]).is_err());
        assert!(StepSchedule::new(&[SetpointStep::new(5.0, 1.0), SetpointStep::new(1.0, 2.0)]).is_err());
        assert!(StepSchedule::new(&[SetpointStep::new(0.0, f64::NAN)]).is_err());
    }

    #[test]
    fn disturbance_test() {
        let mdl = DisturbanceModel::new(PhysicalConstants::default());

        let s0 = mdl.sample(0.0);
        assert_eq!(s0.inlet_flow, 20.0);
        assert_eq!(s0.temperature, 35.0);
        assert_eq!(s0.pressure, 6.0);

        let t = 7.3;
        let s = mdl.sample(t);
        assert_relative_eq!(s.inlet_flow, 20.0 + 2.0 * (0.1 * t).sin());
        assert_relative_eq!(s.temperature, 30.0 + 5.0 * (0.1 * t).cos());
        assert_relative_eq!(s.pressure, 6.0 + (0.05 * t).sin());
    }
}
