//! # シミュレーション条件
//! 時間軸、目標値スケジュール、物理定数をまとめた不変の設定
//!
//! 設定はJSONから読み込めるようにserdeで定義する。全項目にデフォルト値がある。

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// 時間軸の定義（開始時刻と終了時刻を両端に含む等間隔のサンプル）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeGridDef {
    pub start: f64,     // 開始時刻[s]
    pub end: f64,       // 終了時刻[s]
    pub samples: usize, // サンプル数（>= 2）
}

impl Default for TimeGridDef {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 30.0,
            samples: 3000,
        }
    }
}

/// 目標値スケジュールの1区間（from以降はvalueを目標値とする）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetpointStep {
    pub from: f64,  // 区間の開始時刻[s]
    pub value: f64, // 目標流量
}

impl SetpointStep {
    pub fn new(from: f64, value: f64) -> Self {
        Self { from, value }
    }
}

/// 物理定数と外乱の基準値
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    pub initial_flow: f64,        // 入口流量の基準値
    pub initial_temperature: f64, // 温度の基準値[degC]
    pub initial_pressure: f64,    // 圧力の基準値（差圧の基準にもなる）
    pub cd: f64,                  // 流量係数 Cd[-]
    pub area: f64,                // オリフィス面積 A[m^2]
    pub rho: f64,                 // 流体密度[kg/m^3]
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            initial_flow: 20.0,
            initial_temperature: 30.0,
            initial_pressure: 6.0,
            cd: 0.6,
            area: 0.005,
            rho: 1000.0,
        }
    }
}

impl PhysicalConstants {
    pub fn validate(&self) -> anyhow::Result<()> {
        let values = [
            ("initial_flow", self.initial_flow),
            ("initial_temperature", self.initial_temperature),
            ("initial_pressure", self.initial_pressure),
            ("cd", self.cd),
            ("area", self.area),
            ("rho", self.rho),
        ];
        for (name, val) in values.iter() {
            ensure!(val.is_finite(), "PhysicalConstants: {}が有限の値ではありません。({})", name, val);
        }
        ensure!(self.rho > 0.0, "PhysicalConstants: 流体密度rho > 0である必要があります。(rho = {})", self.rho);
        ensure!(self.area >= 0.0, "PhysicalConstants: オリフィス面積 >= 0である必要があります。(area = {})", self.area);
        Ok(())
    }
}

/// 閉ループシミュレーションの設定一式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub time: TimeGridDef,
    pub setpoints: Vec<SetpointStep>,
    pub constants: PhysicalConstants,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time: TimeGridDef::default(),
            setpoints: vec![
                SetpointStep::new(0.0, 8.0),
                SetpointStep::new(10.0, 9.0),
                SetpointStep::new(20.0, 10.0),
            ],
            constants: PhysicalConstants::default(),
        }
    }
}

impl SimulationConfig {
    /// 時間軸・スケジュール・定数をまとめて検証する
    /// 実際の検証は各ランタイム型の生成時に行うので、ここではそれを呼び出すだけ
    pub fn validate(&self) -> anyhow::Result<()> {
        crate::simcore::sim_system::SimTime::try_from(self.time).context("SimulationConfig: 時間軸が不正です。")?;
        crate::simcore::sim_model::source_models::StepSchedule::new(&self.setpoints)
            .context("SimulationConfig: 目標値スケジュールが不正です。")?;
        self.constants.validate().context("SimulationConfig: 物理定数が不正です。")?;
        Ok(())
    }
}
