//! # 信号定義
//! Trajectoryの列定義（信号名と単位）を扱う

pub mod signal;
