//! # 最適化手法の共通インターフェース
//! 評価関数をブラックボックスとして扱い、範囲内でコスト最小のゲインを探す。
//! 勾配や連続性は仮定しない。

use serde::{Deserialize, Serialize};

use crate::simcore::sim_model::controller_models::GainVector;

use super::bounds::GainBounds;
use super::evaluator::CostFunction;
use super::genetic::GeneticAlgorithm;
use super::grid::GridSearch;
use super::swarm::ParticleSwarm;

/// 探索結果
/// 収束しなかった場合もエラーにはせず、その時点の最良点とコストを返す
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchResult {
    pub gains: GainVector,  // 最良ゲイン
    pub cost: f64,          // 最良コスト
    pub evaluations: usize, // 評価関数の呼び出し回数
    pub iterations: usize,  // 実行した反復回数
}

pub trait Minimizer {
    /// ログ表示用の名前
    fn name(&self) -> &'static str;

    /// 評価関数を最小化する
    /// 返すゲインは必ずboundsの範囲内
    fn minimize(&self, objective: &dyn CostFunction, bounds: &GainBounds) -> anyhow::Result<SearchResult>;
}

/// 最適化手法の切り替え用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SearchMethod {
    Swarm(ParticleSwarm),
    Genetic(GeneticAlgorithm),
    Grid(GridSearch),
}

impl SearchMethod {
    fn as_minimizer(&self) -> &dyn Minimizer {
        match self {
            SearchMethod::Swarm(m) => m,
            SearchMethod::Genetic(m) => m,
            SearchMethod::Grid(m) => m,
        }
    }
}

impl Minimizer for SearchMethod {
    fn name(&self) -> &'static str {
        self.as_minimizer().name()
    }

    fn minimize(&self, objective: &dyn CostFunction, bounds: &GainBounds) -> anyhow::Result<SearchResult> {
        self.as_minimizer().minimize(objective, bounds)
    }
}
