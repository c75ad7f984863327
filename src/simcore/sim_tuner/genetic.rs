//! # 遺伝的アルゴリズム（実数値）
//!
//! 1世代の流れ
//! 1. コスト昇順に並べる
//! 2. 上位num_elit個体をそのまま親に残し、残りの親はルーレット選択で選ぶ
//! 3. 親2体から一様交叉（確率crossover_probability）で子2体を作り、遺伝子ごとに
//!    確率mutation_probabilityで範囲内の一様乱数に置き換える
//! 4. 親 + 子を次世代とする（評価するのは子だけ）

use anyhow::{anyhow, ensure};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::simcore::sim_model::controller_models::GainVector;

use super::bounds::GainBounds;
use super::evaluator::{BatchEvaluator, CostFunction};
use super::optimizer::{Minimizer, SearchResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticAlgorithm {
    pub population_size: usize,                             // 個体数
    pub max_iterations: usize,                              // 最大世代数
    pub mutation_probability: f64,                          // 突然変異確率（遺伝子ごと）
    pub crossover_probability: f64,                         // 交叉確率（親のペアごと）
    pub elite_ratio: f64,                                   // エリートの比率（>0なら最低1個体）
    pub parents_portion: f64,                               // 次世代に残す親の比率
    pub max_iterations_without_improvement: Option<usize>,  // 改善しない世代がこれだけ続いたら終了
    pub seed: u64,                                          // 乱数シード
    pub max_evaluations: Option<usize>,                     // 評価回数の上限
    pub parallel: bool,                                     // 子の評価を並列に行う
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_iterations: 100,
            mutation_probability: 0.1,
            crossover_probability: 0.5,
            elite_ratio: 0.01,
            parents_portion: 0.3,
            max_iterations_without_improvement: None,
            seed: 7,
            max_evaluations: None,
            parallel: false,
        }
    }
}

/// 個体（遺伝子 = ゲイン）
#[derive(Debug, Clone, Copy)]
struct Individual {
    genes: Vector3<f64>,
    cost: f64,
}

impl GeneticAlgorithm {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.population_size >= 2, "GeneticAlgorithm: 個体数は2以上で設定してください。({})", self.population_size);
        let probs = [
            ("mutation_probability", self.mutation_probability),
            ("crossover_probability", self.crossover_probability),
            ("elite_ratio", self.elite_ratio),
            ("parents_portion", self.parents_portion),
        ];
        for (name, val) in probs.iter() {
            ensure!((0.0..=1.0).contains(val), "GeneticAlgorithm: {}は0〜1の範囲で設定してください。({})", name, val);
        }
        if let Some(max) = self.max_evaluations {
            ensure!(max >= self.population_size,
                "GeneticAlgorithm: 評価回数の上限({})が個体数({})より小さいため初期評価ができません。", max, self.population_size);
        }
        Ok(())
    }

    /// エリート数
    pub fn num_elites(&self) -> usize {
        let trl = self.population_size as f64 * self.elite_ratio;
        if trl < 1.0 && self.elite_ratio > 0.0 {
            1
        } else {
            trl as usize
        }
    }

    /// 親の数（子をペアで作るので 個体数 - 親の数 が偶数になるよう調整する）
    pub fn num_parents(&self) -> usize {
        let mut par_s = ((self.parents_portion * self.population_size as f64) as usize)
            .max(self.num_elites())
            .max(1);
        if (self.population_size - par_s) % 2 != 0 {
            par_s += 1;
        }
        par_s.min(self.population_size)
    }

    /// ルーレット選択用の累積確率（popはコスト昇順）
    fn cumulative_probability(pop: &[Individual]) -> Vec<f64> {
        // 無限大のコストは有限の最大値として扱う
        let finite_max = pop.iter().map(|ind| ind.cost).filter(|c| c.is_finite()).fold(f64::NEG_INFINITY, f64::max);
        let finite_max = if finite_max.is_finite() { finite_max } else { 0.0 };
        let costs: Vec<f64> = pop.iter().map(|ind| if ind.cost.is_finite() { ind.cost } else { finite_max }).collect();

        let minobj = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let shifted: Vec<f64> = if minobj < 0.0 {
            costs.iter().map(|c| c + minobj.abs()).collect()
        } else {
            costs
        };
        let maxnorm = shifted.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let normobj: Vec<f64> = shifted.iter().map(|c| maxnorm - c + 1.0).collect(); // コストが小さいほど大きい
        let sum: f64 = normobj.iter().sum();

        let mut acc = 0.0;
        normobj.iter().map(|n| {
            acc += n / sum;
            acc
        }).collect()
    }

    fn select_parents(&self, pop: &[Individual], rng: &mut StdRng) -> Vec<Individual> {
        let num_elit = self.num_elites();
        let par_s = self.num_parents();
        let cumprob = Self::cumulative_probability(pop);

        let mut parents: Vec<Individual> = pop[..num_elit].to_vec();
        while parents.len() < par_s {
            let r: f64 = rng.gen();
            let idx = cumprob.iter().position(|c| r <= *c).unwrap_or(pop.len() - 1);
            parents.push(pop[idx]);
        }
        parents
    }

    /// 一様交叉
    fn crossover(&self, a: &Vector3<f64>, b: &Vector3<f64>, rng: &mut StdRng) -> (Vector3<f64>, Vector3<f64>) {
        let mut c1 = *a;
        let mut c2 = *b;
        if rng.gen::<f64>() < self.crossover_probability {
            for dim in 0..3 {
                if rng.gen::<f64>() < 0.5 {
                    c1[dim] = b[dim];
                    c2[dim] = a[dim];
                }
            }
        }
        (c1, c2)
    }

    /// 突然変異（遺伝子ごとに範囲内の一様乱数へ置き換え）
    fn mutate(&self, genes: &mut Vector3<f64>, bounds: &GainBounds, rng: &mut StdRng) {
        for dim in 0..3 {
            if rng.gen::<f64>() < self.mutation_probability {
                genes[dim] = bounds.sample_dim(dim, rng);
            }
        }
    }
}

impl Minimizer for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn minimize(&self, objective: &dyn CostFunction, bounds: &GainBounds) -> anyhow::Result<SearchResult> {
        self.validate()?;
        bounds.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut evaluator = BatchEvaluator::new(objective, self.parallel, self.max_evaluations);
        let par_s = self.num_parents();
        let num_children = self.population_size - par_s;

        // 初期集団
        let genes: Vec<Vector3<f64>> = (0..self.population_size).map(|_| bounds.sample_uniform(&mut rng)).collect();
        let costs = evaluator.evaluate(&genes);
        let mut pop: Vec<Individual> = genes.into_iter().zip(costs).map(|(genes, cost)| Individual { genes, cost }).collect();

        let mut best = *pop.iter().min_by(|a, b| a.cost.total_cmp(&b.cost))
            .ok_or_else(|| anyhow!("GeneticAlgorithm: 個体がありません。"))?;

        let mut iterations = 0;
        let mut stall = 0;
        while iterations < self.max_iterations {
            if !evaluator.can_evaluate(num_children) {
                debug!("genetic: 評価回数の上限に達したため終了 (evaluations = {})", evaluator.evaluations());
                break;
            }

            pop.sort_by(|a, b| a.cost.total_cmp(&b.cost)); // 安定ソート

            let parents = self.select_parents(&pop, &mut rng);

            let mut children: Vec<Vector3<f64>> = Vec::with_capacity(num_children);
            while children.len() < num_children {
                let r1 = rng.gen_range(0..parents.len());
                let r2 = rng.gen_range(0..parents.len());
                let (mut c1, mut c2) = self.crossover(&parents[r1].genes, &parents[r2].genes, &mut rng);
                self.mutate(&mut c1, bounds, &mut rng);
                self.mutate(&mut c2, bounds, &mut rng);
                children.push(c1);
                children.push(c2);
            }
            children.truncate(num_children);

            let child_costs = evaluator.evaluate(&children);
            iterations += 1;

            pop = parents;
            pop.extend(children.into_iter().zip(child_costs).map(|(genes, cost)| Individual { genes, cost }));

            let gen_best = *pop.iter().min_by(|a, b| a.cost.total_cmp(&b.cost))
                .ok_or_else(|| anyhow!("GeneticAlgorithm: 個体がありません。"))?;
            if gen_best.cost < best.cost {
                best = gen_best;
                stall = 0;
                debug!("genetic: generation {} best cost = {:.6} gains = {:?}", iterations, best.cost, GainVector::from(best.genes));
            } else {
                stall += 1;
            }

            if let Some(limit) = self.max_iterations_without_improvement {
                if stall >= limit {
                    debug!("genetic: {}世代改善がないため終了", stall);
                    break;
                }
            }
        }

        let result = SearchResult {
            gains: GainVector::from(best.genes),
            cost: best.cost,
            evaluations: evaluator.evaluations(),
            iterations: iterations,
        };
        info!("genetic: cost = {:.6}, gains = {:?}, evaluations = {}", result.cost, result.gains, result.evaluations);
        Ok(result)
    }
}
