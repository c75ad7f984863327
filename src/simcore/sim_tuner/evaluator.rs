//! # 評価関数の呼び出し
//! 探索手法から評価関数を呼ぶときの共通処理
//!
//! - 評価回数の上限管理
//! - バッチ評価の並列化（rayon）
//! - NaNの評価値は+∞として扱う

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::simcore::sim_model::controller_models::GainVector;

/// ゲイン -> コスト の評価関数
/// 評価は副作用を持たないこと（並列に呼ばれる可能性がある）
pub trait CostFunction: Sync {
    fn cost(&self, gains: &GainVector) -> f64;
}

impl<F> CostFunction for F
where
    F: Fn(&GainVector) -> f64 + Sync,
{
    fn cost(&self, gains: &GainVector) -> f64 {
        self(gains)
    }
}

/// 大小比較できない評価値を+∞に置き換える
pub fn sanitize_cost(cost: f64) -> f64 {
    if cost.is_nan() {
        f64::INFINITY
    } else {
        cost
    }
}

/// 評価回数を数えながらバッチ単位で評価関数を呼ぶ
pub struct BatchEvaluator<'a> {
    objective: &'a dyn CostFunction,
    parallel: bool,                 // trueならワーカースレッドで評価
    max_evaluations: Option<usize>, // 評価回数の上限（Noneは無制限）
    evaluations: usize,             // これまでの評価回数
}

impl<'a> BatchEvaluator<'a> {
    pub fn new(objective: &'a dyn CostFunction, parallel: bool, max_evaluations: Option<usize>) -> Self {
        Self {
            objective: objective,
            parallel: parallel,
            max_evaluations: max_evaluations,
            evaluations: 0,
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// あとn回評価できるか
    pub fn can_evaluate(&self, n: usize) -> bool {
        match self.max_evaluations {
            Some(max) => self.evaluations + n <= max,
            None => true,
        }
    }

    /// 各点を評価する。結果の並びは入力の並びと同じ
    /// 上限の確認は呼び出し側でcan_evaluate()により行う
    pub fn evaluate(&mut self, points: &[Vector3<f64>]) -> Vec<f64> {
        let objective = self.objective;
        let eval = |p: &Vector3<f64>| sanitize_cost(objective.cost(&GainVector::from(*p)));

        let costs = if self.parallel {
            points.par_iter().map(eval).collect::<Vec<f64>>()
        } else {
            points.iter().map(eval).collect::<Vec<f64>>()
        };

        self.evaluations += points.len();
        costs
    }
}

/// 最小値とそのインデックス（空ならNone）
pub fn argmin(costs: &[f64]) -> Option<(usize, f64)> {
    costs.iter().copied().enumerate().fold(None, |best, (idx, c)| match best {
        Some((_, b)) if b <= c => best,
        _ => Some((idx, c)),
    })
}

#[cfg(test)]
mod evaluator_test {
    use super::*;

    fn sphere(g: &GainVector) -> f64 {
        g.kp * g.kp + g.ki * g.ki + g.kd * g.kd
    }

    #[test]
    fn closure_is_cost_function() {
        let offset = 1.0;
        let f = move |g: &GainVector| sphere(g) + offset;
        assert_eq!(f.cost(&GainVector::new(1.0, 0.0, 0.0)), 2.0);
    }

    #[test]
    fn batch_counts_and_order() {
        let points = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 0.0, 3.0)];

        let mut serial = BatchEvaluator::new(&sphere, false, Some(6));
        assert_eq!(serial.evaluate(&points), vec![1.0, 4.0, 9.0]);
        assert_eq!(serial.evaluations(), 3);
        assert!(serial.can_evaluate(3));
        assert!(!serial.can_evaluate(4));

        let mut parallel = BatchEvaluator::new(&sphere, true, None);
        assert_eq!(parallel.evaluate(&points), vec![1.0, 4.0, 9.0]);
        assert!(parallel.can_evaluate(usize::MAX / 2));
    }

    #[test]
    fn nan_becomes_infinity() {
        let f = |_: &GainVector| f64::NAN;
        let mut ev = BatchEvaluator::new(&f, false, None);
        assert_eq!(ev.evaluate(&[Vector3::zeros()]), vec![f64::INFINITY]);
        assert_eq!(ev.evaluations(), 1);
    }

    #[test]
    fn argmin_test() {
        assert_eq!(argmin(&[]), None);
        assert_eq!(argmin(&[3.0, 1.0, 2.0, 1.0]), Some((1, 1.0))); // 同値は先頭を優先
        assert_eq!(argmin(&[f64::INFINITY, 5.0]), Some((1, 5.0)));
    }
}
