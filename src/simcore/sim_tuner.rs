//! # チューナー
//! シミュレーション結果を評価関数に通し、PIDゲイン空間をブラックボックス探索する
//!
//! - bounds    : 探索範囲
//! - objective : 追従誤差 + 整定後ペナルティの評価関数
//! - evaluator : 評価関数の呼び出し（並列化、評価回数の上限）
//! - optimizer : 最適化手法の共通インターフェース
//! - swarm / genetic / grid : 粒子群、遺伝的アルゴリズム、グリッド探索
//! - driver    : 2つの探索を順に実行し、採用するゲインを決める

pub mod bounds;
pub mod driver;
pub mod evaluator;
pub mod genetic;
pub mod grid;
pub mod objective;
pub mod optimizer;
pub mod swarm;
