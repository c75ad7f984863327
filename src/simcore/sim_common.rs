//! # 共通処理
//! モデル間で共用する小さな補助機能

/// 上下限ガード
pub trait Saturation {
    /// (min, max) の範囲に値を制限する
    fn guard_minmax(self, minmax: (f64, f64)) -> f64;
}

impl Saturation for f64 {
    fn guard_minmax(self, minmax: (f64, f64)) -> f64 {
        if self < minmax.0 {
            minmax.0
        } else if self > minmax.1 {
            minmax.1
        } else {
            self
        }
    }
}
