//! # controllerモデル
//! Controllerモデルには、下記のモデルを実装する
//!
//! - 流量PID制御モデル（環境補正係数と入口流量による出力制限付き）

use anyhow::ensure;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::de_models::Integrator;
use super::process_models::{correction_factor, Orifice};
use super::source_models::DisturbanceSample;

use super::super::sim_config::PhysicalConstants;

/// PIDゲイン (Kp, Ki, Kd)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GainVector {
    pub kp: f64, // 比例ゲイン
    pub ki: f64, // 積分ゲイン
    pub kd: f64, // 微分ゲイン
}

impl GainVector {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.kp, self.ki, self.kd)
    }

    /// 全ゲインが有限の値であること
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite(),
            "GainVector: ゲインは有限の値で設定してください。(kp = {}, ki = {}, kd = {})", self.kp, self.ki, self.kd);
        Ok(())
    }
}

impl From<Vector3<f64>> for GainVector {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<GainVector> for Vector3<f64> {
    fn from(g: GainVector) -> Self {
        g.to_vector()
    }
}

/// update()の出力
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub control_signal: f64, // 制御出力
    pub orifice_flow: f64,   // オリフィス流量
}

/// 流量PIDコントローラモデル
/// 内部状態（積分値、前回誤差）はインスタンスごとに持ち、途中でリセットしない
#[derive(Debug, Clone)]
pub struct FlowPIDController {
    gain: GainVector,             // PIDゲイン
    setpoint: f64,                // 目標値
    integrator: Integrator,       // 誤差の積分器（アンチワインドアップなし）
    e_old: f64,                   // 誤差前回値（微分用）
    constants: PhysicalConstants, // 補正係数・差圧の基準値
    orifice: Orifice,
}

impl FlowPIDController {
    pub fn new(gain: GainVector, setpoint: f64, constants: PhysicalConstants) -> Self {
        Self {
            gain: gain,
            setpoint: setpoint,
            integrator: Integrator::new(0.0),
            e_old: 0.0,
            constants: constants,
            orifice: Orifice::new(&constants),
        }
    }

    pub fn gain(&self) -> GainVector {
        self.gain
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// ステップ間で目標値を切り替える
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// 誤差の積分値
    pub fn integral(&self) -> f64 {
        self.integrator.val()
    }

    /// 前回の誤差
    pub fn previous_error(&self) -> f64 {
        self.e_old
    }

    /// 1ステップ分の制御出力とオリフィス流量を計算する
    /// delta_t <= 0 の場合は状態を変えずにエラーを返す
    pub fn update(&mut self, process_variable: f64, delta_t: f64, sample: &DisturbanceSample) -> anyhow::Result<ControlOutput> {
        ensure!(delta_t.is_finite() && delta_t > 0.0, "FlowPIDController: delta_t > 0である必要があります。(dt = {})", delta_t);

        let err = self.setpoint - process_variable; // 目標値 - 現在値
        let integ = self.integrator.nextstate(err, delta_t); // 積分は出力制限中も更新する
        let diff = (err - self.e_old) / delta_t; // 単純微分

        let delta_p = sample.pressure - self.constants.initial_pressure; // 差圧は実行開始時の圧力が基準
        let orifice_flow = self.orifice.flow(delta_p);

        let flow_factor = correction_factor(sample.inlet_flow, self.constants.initial_flow);
        let temp_factor = correction_factor(sample.temperature, self.constants.initial_temperature);
        let pressure_factor = correction_factor(sample.pressure, self.constants.initial_pressure);

        let control_signal = if sample.inlet_flow < self.setpoint {
            sample.inlet_flow // 入口流量を超える出力は出せない
        } else {
            let g = self.gain;
            (g.kp * err + g.ki * integ + g.kd * diff) * flow_factor * temp_factor * pressure_factor
        };

        self.e_old = err; // 前回値更新

        Ok(ControlOutput {
            control_signal: control_signal,
            orifice_flow: orifice_flow,
        })
    }
}

#[cfg(test)]
mod controller_models_test {
    use super::*;
    use crate::simcore::sim_model::process_models::orifice_flow;
    use approx::assert_relative_eq;

    fn sample(inlet_flow: f64, temperature: f64, pressure: f64) -> DisturbanceSample {
        DisturbanceSample { inlet_flow, temperature, pressure }
    }

    #[test]
    fn pid_law_at_reference_conditions() {
        // 基準値どおりの外乱なら補正係数はすべて1
        let consts = PhysicalConstants::default();
        let mut ctrl = FlowPIDController::new(GainVector::new(2.0, 0.5, 0.1), 8.0, consts);

        let out = ctrl.update(3.0, 0.1, &sample(20.0, 30.0, 6.0)).unwrap();
        // err = 5, integ = 0.5, diff = 50
        assert_relative_eq!(out.control_signal, 2.0 * 5.0 + 0.5 * 0.5 + 0.1 * 50.0, max_relative = 1e-12);
        assert_eq!(out.orifice_flow, 0.0);
        assert_eq!(ctrl.previous_error(), 5.0);

        let out = ctrl.update(4.0, 0.1, &sample(20.0, 30.0, 6.0)).unwrap();
        // err = 4, integ = 0.9, diff = -10
        assert_relative_eq!(out.control_signal, 2.0 * 4.0 + 0.5 * 0.9 + 0.1 * -10.0, max_relative = 1e-12);
    }

    #[test]
    fn correction_factors_multiply() {
        let consts = PhysicalConstants::default();
        let mut ctrl = FlowPIDController::new(GainVector::new(1.0, 0.0, 0.0), 8.0, consts);

        let out = ctrl.update(0.0, 0.01, &sample(22.0, 25.0, 7.0)).unwrap();
        let expected = 8.0 * 1.02 * 0.95 * 1.01;
        assert_relative_eq!(out.control_signal, expected, max_relative = 1e-12);
        assert_relative_eq!(out.orifice_flow, orifice_flow(0.6, 0.005, 1000.0, 1.0), max_relative = 1e-12);
    }

    #[test]
    fn clamp_bypasses_pid_but_keeps_state() {
        let consts = PhysicalConstants::default();
        let mut ctrl = FlowPIDController::new(GainVector::new(10.0, 1.0, 1.0), 15.0, consts);

        let dt = 0.01;
        let out1 = ctrl.update(1.0, dt, &sample(12.0, 30.0, 6.0)).unwrap();
        assert_eq!(out1.control_signal, 12.0);
        let out2 = ctrl.update(2.0, dt, &sample(11.5, 30.0, 6.5)).unwrap();
        assert_eq!(out2.control_signal, 11.5);

        // 出力制限中も積分値と前回誤差は更新されている
        assert_relative_eq!(ctrl.integral(), 14.0 * dt + 13.0 * dt, max_relative = 1e-12);
        assert_eq!(ctrl.previous_error(), 13.0);
    }

    #[test]
    fn integral_is_running_sum() {
        let mut ctrl = FlowPIDController::new(GainVector::new(1.0, 0.1, 0.05), 9.0, PhysicalConstants::default());
        let dt = 0.02;
        let mut expected = 0.0;

        for (i, pv) in [0.0, 1.5, 4.0, 8.5, 9.7, 9.1].iter().enumerate() {
            let inlet = if i % 2 == 0 { 20.0 } else { 5.0 }; // 出力制限の有無を交互に切り替える
            ctrl.update(*pv, dt, &sample(inlet, 30.0, 6.0)).unwrap();
            expected += (9.0 - pv) * dt;
            assert_relative_eq!(ctrl.integral(), expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn reject_non_positive_dt() {
        let mut ctrl = FlowPIDController::new(GainVector::new(1.0, 0.1, 0.05), 8.0, PhysicalConstants::default());

        assert!(ctrl.update(0.0, 0.0, &sample(20.0, 30.0, 6.0)).is_err());
        assert!(ctrl.update(0.0, -0.01, &sample(20.0, 30.0, 6.0)).is_err());
        assert!(ctrl.update(0.0, f64::NAN, &sample(20.0, 30.0, 6.0)).is_err());

        // 拒否されたステップでは状態が変わらない
        assert_eq!(ctrl.integral(), 0.0);
        assert_eq!(ctrl.previous_error(), 0.0);
        assert!(ctrl.update(0.0, 0.01, &sample(20.0, 30.0, 6.0)).unwrap().control_signal.is_finite());
    }

    #[test]
    fn gain_vector_validate() {
        assert!(GainVector::new(1.0, 0.1, 0.05).validate().is_ok());
        assert!(GainVector::new(f64::NAN, 0.1, 0.05).validate().is_err());
        assert!(GainVector::new(1.0, f64::INFINITY, 0.05).validate().is_err());
        assert!(GainVector::new(1.0, 0.1, f64::NEG_INFINITY).validate().is_err());
    }

    #[test]
    fn gain_vector_conversion() {
        let g = GainVector::new(1.0, 0.2, 0.3);
        let v: Vector3<f64> = g.into();

        assert_eq!(v, Vector3::new(1.0, 0.2, 0.3));
        assert_eq!(GainVector::from(v * 2.0), GainVector::new(2.0, 0.4, 0.6));
    }
}
