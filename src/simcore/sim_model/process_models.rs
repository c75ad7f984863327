//! # プロセスモデル
//! - オリフィス流量（平方根則）
//! - 環境補正係数（基準値からの偏差に比例）

use super::super::sim_config::PhysicalConstants;

/// 補正係数の感度（偏差1あたり1%）
pub const CORRECTION_GAIN: f64 = 0.01;

/// オリフィスの流量式 Q = Cd * A * sqrt(2|ΔP| / rho)
/// 差圧は絶対値を取るので根号の中が負になることはない
pub fn orifice_flow(cd: f64, area: f64, rho: f64, delta_p: f64) -> f64 {
    cd * area * (2.0 * delta_p.abs() / rho).sqrt()
}

/// 補正係数 1 + 0.01 * (値 - 基準値)
pub fn correction_factor(value: f64, reference: f64) -> f64 {
    1.0 + CORRECTION_GAIN * (value - reference)
}

/// 物理定数を束ねたオリフィスモデル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orifice {
    cd: f64,   // 流量係数
    area: f64, // 面積
    rho: f64,  // 密度
}

impl Orifice {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            cd: constants.cd,
            area: constants.area,
            rho: constants.rho,
        }
    }

    pub fn flow(&self, delta_p: f64) -> f64 {
        orifice_flow(self.cd, self.area, self.rho, delta_p)
    }
}
