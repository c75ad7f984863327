//! # flow_tune_sim
//! 流量制御ループ（入口流量・温度・圧力の外乱付き）のシミュレータと、
//! 粒子群探索・遺伝的アルゴリズムによるPIDゲインチューニング

pub mod prelude;
pub mod simcore;
