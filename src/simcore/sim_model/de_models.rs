//! # DEモデル
//! - 積分器モデル（前進オイラー法）

/// 積分器
/// 1ステップごとに 状態 += 入力 * Δt で更新する
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    state: f64, // 積分値
}

impl Integrator {
    pub fn new(init_state: f64) -> Self {
        Self { state: init_state }
    }

    /// 現在の積分値
    pub fn val(&self) -> f64 {
        self.state
    }

    /// 1ステップ積分し、更新後の値を返す
    pub fn nextstate(&mut self, input: f64, delta_t: f64) -> f64 {
        self.state += input * delta_t;
        self.state
    }
}
