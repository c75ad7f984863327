//! モデルを組み合わせて流量制御の閉ループシステムを構成する

use anyhow::{anyhow, Context};

use super::sim_config::{PhysicalConstants, SimulationConfig, TimeGridDef};
use super::sim_model::controller_models::{FlowPIDController, GainVector};
use super::sim_model::de_models::Integrator;
use super::sim_model::sink_models::{Trajectory, TrajectoryRecord};
use super::sim_model::source_models::{DisturbanceModel, StepSchedule};

/// シミュレーションの時間軸
/// 開始時刻と終了時刻を両端に含む等間隔のstep_num点で構成する
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTime {
    start_time: f64, // 開始時刻
    end_time: f64,   // 終了時刻
    step_num: usize, // サンプル数
    delta_t: f64,    // 時間刻み
}

impl SimTime {
    pub fn new(start_time: f64, end_time: f64, step_num: usize) -> anyhow::Result<Self> {
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err(anyhow!("SimTime: 開始時刻と終了時刻は有限の値で設定してください。(start = {}, end = {})", start_time, end_time));
        }

        if step_num < 2 {
            return Err(anyhow!("SimTime: サンプル数は2以上で設定してください。(samples = {})", step_num));
        }

        let delta_t = (end_time - start_time) / (step_num - 1) as f64;
        if !(delta_t > 0.0) {
            return Err(anyhow!("SimTime: 時間刻みが0以下になります。終了時刻 > 開始時刻で設定してください。(dt = {})", delta_t));
        }

        Ok(Self {
            start_time: start_time,
            end_time: end_time,
            step_num: step_num,
            delta_t: delta_t,
        })
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn step_num(&self) -> usize {
        self.step_num
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// idx番目のサンプル時刻
    pub fn time_at(&self, idx: usize) -> f64 {
        self.start_time + idx as f64 * self.delta_t
    }

    /// 全サンプル時刻のイテレータ
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.step_num).map(move |idx| self.time_at(idx))
    }
}

impl TryFrom<TimeGridDef> for SimTime {
    type Error = anyhow::Error;

    fn try_from(def: TimeGridDef) -> anyhow::Result<Self> {
        SimTime::new(def.start, def.end, def.samples)
    }
}

/// 流量制御ループ
/// 検証済みの設定を保持するだけで、実行ごとの状態（コントローラ、プロセス値、記録）は
/// run()の中で新しく作る。そのため複数スレッドから同時にrun()を呼んでもよい
#[derive(Debug, Clone)]
pub struct FlowLoopSystem {
    sim_time: SimTime,
    schedule: StepSchedule,
    constants: PhysicalConstants,
    disturbance: DisturbanceModel,
}

impl FlowLoopSystem {
    pub fn new(config: &SimulationConfig) -> anyhow::Result<Self> {
        let sim_time = SimTime::try_from(config.time).context("FlowLoopSystem: 時間軸が不正です。")?;
        let schedule = StepSchedule::new(&config.setpoints).context("FlowLoopSystem: 目標値スケジュールが不正です。")?;
        config.constants.validate().context("FlowLoopSystem: 物理定数が不正です。")?;

        Ok(Self {
            sim_time: sim_time,
            schedule: schedule,
            constants: config.constants,
            disturbance: DisturbanceModel::new(config.constants),
        })
    }

    pub fn sim_time(&self) -> &SimTime {
        &self.sim_time
    }

    pub fn schedule(&self) -> &StepSchedule {
        &self.schedule
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    /// 指定ゲインで閉ループを1回シミュレーションする
    /// 有限でないゲインはNaNの時系列になるので実行前に拒否する
    pub fn run(&self, gains: &GainVector) -> anyhow::Result<Trajectory> {
        gains.validate().context("FlowLoopSystem: ゲインが不正です。")?;

        let delta_t = self.sim_time.delta_t();
        let init_setpoint = self.schedule.value_at(self.sim_time.start_time());

        let mut controller = FlowPIDController::new(*gains, init_setpoint, self.constants);
        let mut process = Integrator::new(0.0); // プロセス値は制御出力の積分
        let mut trajectory = Trajectory::with_capacity(self.sim_time.step_num());

        for time in self.sim_time.iter() {
            let sample = self.disturbance.sample(time);
            let setpoint = self.schedule.value_at(time);
            controller.set_setpoint(setpoint);

            let out = controller.update(process.val(), delta_t, &sample)?;
            let process_value = process.nextstate(out.control_signal, delta_t);

            trajectory.push(TrajectoryRecord {
                time: time,
                process_value: process_value,
                setpoint: setpoint,
                inlet_flow: sample.inlet_flow,
                temperature: sample.temperature,
                pressure: sample.pressure,
                orifice_flow: out.orifice_flow,
                control_signal: out.control_signal,
            });
        }

        Ok(trajectory)
    }
}

/// 設定の検証とシミュレーションをまとめて行う
pub fn simulate(gains: &GainVector, config: &SimulationConfig) -> anyhow::Result<Trajectory> {
    let system = FlowLoopSystem::new(config)?;
    system.run(gains)
}
