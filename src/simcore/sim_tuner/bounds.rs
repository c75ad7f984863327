//! # 探索範囲
//! ゲイン空間の箱型制約 [lower, upper]

use anyhow::ensure;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::simcore::sim_common::Saturation;
use crate::simcore::sim_model::controller_models::GainVector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainBounds {
    pub lower: GainVector, // 下限
    pub upper: GainVector, // 上限
}

impl Default for GainBounds {
    fn default() -> Self {
        Self {
            lower: GainVector::new(0.0, 0.0, 0.0),
            upper: GainVector::new(10.0, 1.0, 1.0),
        }
    }
}

impl GainBounds {
    pub fn new(lower: GainVector, upper: GainVector) -> anyhow::Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// 各次元で 下限 <= 上限 かつ有限であること
    pub fn validate(&self) -> anyhow::Result<()> {
        let lo = self.lower_vec();
        let hi = self.upper_vec();
        for (dim, name) in ["kp", "ki", "kd"].iter().enumerate() {
            ensure!(lo[dim].is_finite() && hi[dim].is_finite(),
                "GainBounds: {}の範囲は有限の値で設定してください。(lower = {}, upper = {})", name, lo[dim], hi[dim]);
            ensure!(lo[dim] <= hi[dim],
                "GainBounds: {}の下限が上限を超えています。(lower = {}, upper = {})", name, lo[dim], hi[dim]);
        }
        Ok(())
    }

    pub fn lower_vec(&self) -> Vector3<f64> {
        self.lower.to_vector()
    }

    pub fn upper_vec(&self) -> Vector3<f64> {
        self.upper.to_vector()
    }

    /// 上限 - 下限
    pub fn span(&self) -> Vector3<f64> {
        self.upper_vec() - self.lower_vec()
    }

    pub fn contains(&self, gains: &GainVector) -> bool {
        let v = gains.to_vector();
        let lo = self.lower_vec();
        let hi = self.upper_vec();
        (0..3).all(|dim| lo[dim] <= v[dim] && v[dim] <= hi[dim])
    }

    /// 範囲外の成分を境界に張り付ける
    pub fn clip(&self, point: &Vector3<f64>) -> Vector3<f64> {
        let lo = self.lower_vec();
        let hi = self.upper_vec();
        Vector3::from_fn(|dim, _| point[dim].guard_minmax((lo[dim], hi[dim])))
    }

    /// 範囲内の一様乱数
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        let lo = self.lower_vec();
        let span = self.span();
        let point = Vector3::from_fn(|dim, _| lo[dim] + rng.gen::<f64>() * span[dim]);
        self.clip(&point) // 丸め誤差で上限を越えないように
    }

    /// dim次元目だけを範囲内の一様乱数にする
    pub fn sample_dim<R: Rng + ?Sized>(&self, dim: usize, rng: &mut R) -> f64 {
        let lo = self.lower_vec()[dim];
        let hi = self.upper_vec()[dim];
        (lo + rng.gen::<f64>() * (hi - lo)).guard_minmax((lo, hi))
    }
}
