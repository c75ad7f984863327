//! # 粒子群最適化（PSO）
//!
//! 各粒子の速度を 慣性 + 自己ベストへの引力 + 群ベストへの引力 で更新し、
//! 位置は毎回探索範囲に張り付ける。群ベストが更新されたとき、
//! 改善量がmin_func以下、または移動量がmin_step以下なら打ち切る。

use anyhow::{anyhow, ensure};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::simcore::sim_model::controller_models::GainVector;

use super::bounds::GainBounds;
use super::evaluator::{argmin, BatchEvaluator, CostFunction};
use super::optimizer::{Minimizer, SearchResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSwarm {
    pub swarm_size: usize,              // 粒子数
    pub max_iterations: usize,          // 最大反復回数
    pub omega: f64,                     // 慣性係数
    pub phi_p: f64,                     // 自己ベストへの係数
    pub phi_g: f64,                     // 群ベストへの係数
    pub min_step: f64,                  // 群ベストの移動量がこれ以下なら終了
    pub min_func: f64,                  // 群ベストの改善量がこれ以下なら終了
    pub seed: u64,                      // 乱数シード
    pub max_evaluations: Option<usize>, // 評価回数の上限
    pub parallel: bool,                 // 粒子の評価を並列に行う
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self {
            swarm_size: 50,
            max_iterations: 100,
            omega: 0.5,
            phi_p: 0.5,
            phi_g: 0.5,
            min_step: 1e-8,
            min_func: 1e-8,
            seed: 42,
            max_evaluations: None,
            parallel: false,
        }
    }
}

impl ParticleSwarm {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.swarm_size > 0, "ParticleSwarm: 粒子数は1以上で設定してください。");
        for (name, val) in [("omega", self.omega), ("phi_p", self.phi_p), ("phi_g", self.phi_g)].iter() {
            ensure!(val.is_finite(), "ParticleSwarm: {}が有限の値ではありません。({})", name, val);
        }
        ensure!(self.min_step >= 0.0 && self.min_func >= 0.0,
            "ParticleSwarm: min_step, min_funcは0以上で設定してください。");
        if let Some(max) = self.max_evaluations {
            ensure!(max >= self.swarm_size,
                "ParticleSwarm: 評価回数の上限({})が粒子数({})より小さいため初期評価ができません。", max, self.swarm_size);
        }
        Ok(())
    }
}

impl Minimizer for ParticleSwarm {
    fn name(&self) -> &'static str {
        "swarm"
    }

    fn minimize(&self, objective: &dyn CostFunction, bounds: &GainBounds) -> anyhow::Result<SearchResult> {
        self.validate()?;
        bounds.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut evaluator = BatchEvaluator::new(objective, self.parallel, self.max_evaluations);
        let span = bounds.span();

        // 初期位置は範囲内の一様乱数、初期速度は[-span, span]の一様乱数
        let mut x: Vec<Vector3<f64>> = (0..self.swarm_size).map(|_| bounds.sample_uniform(&mut rng)).collect();
        let mut v: Vec<Vector3<f64>> = (0..self.swarm_size)
            .map(|_| Vector3::from_fn(|dim, _| -span[dim] + 2.0 * rng.gen::<f64>() * span[dim]))
            .collect();

        let fx = evaluator.evaluate(&x);
        let mut p = x.clone(); // 各粒子の自己ベスト
        let mut fp = fx;

        let (gidx, mut fg) = argmin(&fp).ok_or_else(|| anyhow!("ParticleSwarm: 粒子がありません。"))?;
        let mut g = p[gidx]; // 群ベスト

        let mut iterations = 0;
        while iterations < self.max_iterations {
            if !evaluator.can_evaluate(self.swarm_size) {
                debug!("swarm: 評価回数の上限に達したため終了 (evaluations = {})", evaluator.evaluations());
                break;
            }

            for i in 0..self.swarm_size {
                let rp = Vector3::from_fn(|_, _| rng.gen::<f64>());
                let rg = Vector3::from_fn(|_, _| rng.gen::<f64>());
                v[i] = self.omega * v[i]
                    + self.phi_p * rp.component_mul(&(p[i] - x[i]))
                    + self.phi_g * rg.component_mul(&(g - x[i]));
                x[i] = bounds.clip(&(x[i] + v[i]));
            }

            let fx = evaluator.evaluate(&x);
            iterations += 1;

            for i in 0..self.swarm_size {
                if fx[i] < fp[i] {
                    p[i] = x[i];
                    fp[i] = fx[i];
                }
            }

            let (imin, fmin) = argmin(&fp).ok_or_else(|| anyhow!("ParticleSwarm: 粒子がありません。"))?;
            if fmin < fg {
                let stepsize = (g - p[imin]).norm();
                let improvement = fg - fmin;
                g = p[imin];
                fg = fmin;
                debug!("swarm: iteration {} best cost = {:.6} gains = {:?}", iterations, fg, GainVector::from(g));

                if improvement <= self.min_func {
                    debug!("swarm: 群ベストの改善量がmin_func以下のため終了 ({:e})", improvement);
                    break;
                }
                if stepsize <= self.min_step {
                    debug!("swarm: 群ベストの移動量がmin_step以下のため終了 ({:e})", stepsize);
                    break;
                }
            }
        }

        let result = SearchResult {
            gains: GainVector::from(g),
            cost: fg,
            evaluations: evaluator.evaluations(),
            iterations: iterations,
        };
        info!("swarm: cost = {:.6}, gains = {:?}, evaluations = {}", result.cost, result.gains, result.evaluations);
        Ok(result)
    }
}
