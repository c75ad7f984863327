//! # チューニングの実行
//!
//! 粒子群探索 -> 遺伝的アルゴリズムの順に実行し、selectionに従って採用するゲインを決める。
//! デフォルト（Genetic）では後段の遺伝的アルゴリズムの結果で粒子群の結果を上書きする。
//! 最後に採用したゲインで1回シミュレーションし直し、結果のTrajectoryを返す。

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::simcore::sim_config::SimulationConfig;
use crate::simcore::sim_model::sink_models::Trajectory;

use super::bounds::GainBounds;
use super::genetic::GeneticAlgorithm;
use super::objective::{CostBreakdown, ObjectiveConfig, TrackingObjective};
use super::optimizer::{Minimizer, SearchMethod, SearchResult};
use super::swarm::ParticleSwarm;

/// どちらの探索結果を採用するか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSelection {
    /// 後段（遺伝的アルゴリズム）の結果で上書きする
    #[default]
    Genetic,
    /// 前段（粒子群）の結果を使う
    Swarm,
    /// コストの小さい方（同じなら後段）
    Best,
}

/// チューニング設定一式（JSONで読み込む）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TuneConfig {
    pub simulation: SimulationConfig,
    pub objective: ObjectiveConfig,
    pub bounds: GainBounds,
    pub swarm: ParticleSwarm,
    pub genetic: GeneticAlgorithm,
    pub selection: ResultSelection,
}

impl TuneConfig {
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let config: TuneConfig = serde_json::from_str(text).context("TuneConfig: JSONの読み込みに失敗しました。")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("TuneConfig: 設定ファイルを開けませんでした。({})", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("TuneConfig: 設定ファイルが不正です。({})", path.display()))
    }

    /// シミュレーションを始める前に設定全体を検証する
    pub fn validate(&self) -> anyhow::Result<()> {
        self.simulation.validate()?;
        self.objective.validate()?;
        self.bounds.validate()?;
        self.swarm.validate()?;
        self.genetic.validate()?;
        Ok(())
    }
}

/// チューニング結果
#[derive(Debug, Clone)]
pub struct TuningReport {
    pub swarm: SearchResult,          // 前段の結果
    pub genetic: SearchResult,        // 後段の結果
    pub selection: ResultSelection,   // 採用規則
    pub selected: SearchResult,       // 採用した結果
    pub breakdown: CostBreakdown,     // 採用ゲインのコスト内訳
    pub trajectory: Trajectory,       // 採用ゲインで再実行した結果
}

pub struct TuningDriver {
    objective: TrackingObjective,
    bounds: GainBounds,
    swarm: SearchMethod,   // 前段
    genetic: SearchMethod, // 後段
    selection: ResultSelection,
}

impl TuningDriver {
    pub fn new(config: &TuneConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let objective = TrackingObjective::from_config(&config.simulation, config.objective)?;

        Ok(Self {
            objective: objective,
            bounds: config.bounds,
            swarm: SearchMethod::Swarm(config.swarm.clone()),
            genetic: SearchMethod::Genetic(config.genetic.clone()),
            selection: config.selection,
        })
    }

    /// 探索手法を差し替えて作る（試験でグリッド探索を使う場合など）
    pub fn with_methods(objective: TrackingObjective, bounds: GainBounds, swarm: SearchMethod, genetic: SearchMethod, selection: ResultSelection) -> anyhow::Result<Self> {
        bounds.validate()?;
        Ok(Self { objective, bounds, swarm, genetic, selection })
    }

    pub fn objective(&self) -> &TrackingObjective {
        &self.objective
    }

    pub fn run(&self) -> anyhow::Result<TuningReport> {
        info!("tuning: {} -> {} (selection = {:?})", self.swarm.name(), self.genetic.name(), self.selection);

        let swarm = self.swarm.minimize(&self.objective, &self.bounds)
            .with_context(|| format!("TuningDriver: {}の探索に失敗しました。", self.swarm.name()))?;
        let genetic = self.genetic.minimize(&self.objective, &self.bounds)
            .with_context(|| format!("TuningDriver: {}の探索に失敗しました。", self.genetic.name()))?;

        let selected = match self.selection {
            ResultSelection::Genetic => genetic,
            ResultSelection::Swarm => swarm,
            ResultSelection::Best => if swarm.cost < genetic.cost { swarm } else { genetic },
        };

        let trajectory = self.objective.system().run(&selected.gains)
            .context("TuningDriver: 採用したゲインで再実行できませんでした。")?;
        let breakdown = self.objective.score(&trajectory);

        info!(
            "tuning: Kp = {:.6}, Ki = {:.6}, Kd = {:.6}, cost = {:.6} (penalized steps = {})",
            selected.gains.kp, selected.gains.ki, selected.gains.kd, breakdown.cost, breakdown.penalized_steps
        );

        Ok(TuningReport {
            swarm: swarm,
            genetic: genetic,
            selection: self.selection,
            selected: selected,
            breakdown: breakdown,
            trajectory: trajectory,
        })
    }
}
