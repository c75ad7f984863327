//! # simcore
//! 流量制御ループのシミュレーションとPIDゲインチューニングの中核部分
//!
//! - sim_system : 時間軸の定義と閉ループシミュレーション本体
//! - sim_config : シミュレーション条件（時間軸、目標値スケジュール、物理定数）
//! - sim_signal : 信号定義（信号名、単位）
//! - sim_model  : 外乱・オリフィス・コントローラ・積分器・記録器の各モデル
//! - sim_tuner  : 評価関数と最適化（粒子群、遺伝的アルゴリズム、グリッド探索）

pub mod sim_common;
pub mod sim_config;
pub mod sim_model;
pub mod sim_signal;
pub mod sim_system;
pub mod sim_tuner;
