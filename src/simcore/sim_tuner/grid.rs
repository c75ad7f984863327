//! # グリッド探索
//! 各軸をpoints_per_axis点で等分割した格子を全点評価する。
//! 乱数を使わないので、再現性が必要な試験で確率的な探索の代わりに使う。

use anyhow::{anyhow, ensure};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::simcore::sim_model::controller_models::GainVector;

use super::bounds::GainBounds;
use super::evaluator::{argmin, BatchEvaluator, CostFunction};
use super::optimizer::{Minimizer, SearchResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearch {
    pub points_per_axis: usize, // 1軸あたりの分割点数
    pub parallel: bool,         // 格子点の評価を並列に行う
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            points_per_axis: 11,
            parallel: false,
        }
    }
}

/// [lo, hi]をn点で等分割（両端を含む。n = 1ならloのみ）
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![lo];
    }
    (0..n).map(|i| if i == n - 1 { hi } else { lo + (hi - lo) * i as f64 / (n - 1) as f64 }).collect()
}

impl GridSearch {
    /// 格子点の一覧（kp, ki, kdの順にネスト）
    pub fn grid_points(&self, bounds: &GainBounds) -> anyhow::Result<Vec<Vector3<f64>>> {
        let total = self.points_per_axis.checked_pow(3)
            .ok_or_else(|| anyhow!("GridSearch: 格子点数が大きすぎます。(points_per_axis = {})", self.points_per_axis))?;

        let lo = bounds.lower_vec();
        let hi = bounds.upper_vec();
        let axes: Vec<Vec<f64>> = (0..3).map(|dim| linspace(lo[dim], hi[dim], self.points_per_axis)).collect();

        let mut points = Vec::with_capacity(total);
        for kp in axes[0].iter() {
            for ki in axes[1].iter() {
                for kd in axes[2].iter() {
                    points.push(Vector3::new(*kp, *ki, *kd));
                }
            }
        }
        Ok(points)
    }
}

impl Minimizer for GridSearch {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn minimize(&self, objective: &dyn CostFunction, bounds: &GainBounds) -> anyhow::Result<SearchResult> {
        ensure!(self.points_per_axis > 0, "GridSearch: 分割点数は1以上で設定してください。");
        bounds.validate()?;

        let points = self.grid_points(bounds)?;
        let mut evaluator = BatchEvaluator::new(objective, self.parallel, None);
        let costs = evaluator.evaluate(&points);

        let (idx, cost) = argmin(&costs).ok_or_else(|| anyhow!("GridSearch: 格子点がありません。"))?;
        let result = SearchResult {
            gains: GainVector::from(points[idx]),
            cost: cost,
            evaluations: evaluator.evaluations(),
            iterations: 1,
        };
        info!("grid: cost = {:.6}, gains = {:?}, evaluations = {}", result.cost, result.gains, result.evaluations);
        Ok(result)
    }
}
