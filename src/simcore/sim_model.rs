//! # モデル群
//! 閉ループを構成する個々のモデル
//!
//! - source_models     : 目標値スケジュール、外乱（入口流量・温度・圧力）
//! - process_models    : オリフィス流量、環境補正係数
//! - controller_models : 流量PIDコントローラ
//! - de_models         : 積分器
//! - sink_models       : Trajectory（時系列の記録）

pub mod controller_models;
pub mod de_models;
pub mod process_models;
pub mod sink_models;
pub mod source_models;
